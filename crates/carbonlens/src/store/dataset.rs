//! The in-memory columnar dataset.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::column::{infer_unit, ColumnKind, ColumnMeta};
use super::loader::{self, is_null_value, RawTable};
use super::names::{
    contains_phrase, normalize_name, similarity, strip_filler_words, COLUMN_ALIASES,
    ENTITY_ALIASES,
};
use super::selection::{EntitySelection, YearSpan};
use super::source::SourceMetadata;
use crate::config::{StoreConfig, DEFAULT_SIMILARITY_FLOOR};
use crate::error::{CarbonLensError, Result};

/// Upper bound on near-miss candidates returned by [`DatasetStore::match_column`].
const NEAR_MISS_LIMIT: usize = 5;

/// Score for a column that contains the fragment on word boundaries.
const SUBSTRING_SCORE: u32 = 50;

/// Minimum similarity for a column to be offered as a near miss.
const NEAR_MISS_SIMILARITY: f64 = 0.5;

/// How a metric fragment matched a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Normalized names are equal.
    Exact,
    /// A known alias names the column.
    Alias,
    /// Equal after dropping filler words such as "total" or "emissions".
    FillerStripped,
    /// One name contains the other on word boundaries.
    Substring,
    /// Edit-distance similarity above the floor.
    Fuzzy,
}

/// Outcome of matching a free-form metric fragment against the columns.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnMatch<'a> {
    /// A single best column.
    Resolved { column: &'a ColumnMeta, tier: MatchTier },
    /// Several columns share the best score.
    Ambiguous { candidates: Vec<String> },
    /// Nothing matched; the closest metric columns are listed.
    Unresolved { near_misses: Vec<String> },
}

/// How an entity name matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityMatch<'a> {
    /// Normalized name equals a dataset entity.
    Exact(&'a str),
    /// A known alias names the entity.
    Alias(&'a str),
}

impl<'a> EntityMatch<'a> {
    /// The canonical entity name.
    pub fn canonical(&self) -> &'a str {
        match self {
            EntityMatch::Exact(name) | EntityMatch::Alias(name) => name,
        }
    }
}

/// A read-only view of one dataset row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    store: &'a DatasetStore,
    index: usize,
}

impl<'a> Row<'a> {
    /// Canonical entity name.
    pub fn entity(&self) -> &'a str {
        &self.store.entity_names[self.store.row_entity[self.index]]
    }

    pub fn year(&self) -> i32 {
        self.store.row_year[self.index]
    }

    /// Value of a metric column, `None` when missing or not a metric.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.store
            .metrics
            .get(column)
            .and_then(|values| values[self.index])
    }

    /// Position of the row in load order.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Immutable, columnar table of rows keyed by `(entity, year)`.
///
/// Built once by [`DatasetStore::load`] and never mutated. Data is only read
/// through [`DatasetStore::rows_matching`].
#[derive(Debug)]
pub struct DatasetStore {
    source: SourceMetadata,
    entity_column: String,
    year_column: String,
    columns: Vec<ColumnMeta>,
    column_index: HashMap<String, usize>,
    column_aliases: Vec<(String, usize)>,
    metrics: IndexMap<String, Vec<Option<f64>>>,
    row_entity: Vec<usize>,
    row_year: Vec<i32>,
    entity_names: Vec<String>,
    entity_norms: Vec<String>,
    entity_rows: Vec<Vec<usize>>,
    entity_index: HashMap<String, usize>,
    entity_aliases: Vec<(String, usize)>,
    year_span: YearSpan,
}

impl DatasetStore {
    /// Load a dataset file.
    ///
    /// Fails with [`CarbonLensError::DataLoad`] when the file is missing or
    /// unreadable, lacks the entity or year column, or has no numeric metric.
    pub fn load(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let raw = loader::read_file(path)
            .map_err(|e| CarbonLensError::data_load(path, e.to_string()))?;
        Self::build(path.to_path_buf(), &raw.bytes, raw.size_bytes, raw.hash, config)
    }

    /// Build a store from any reader, e.g. an in-memory buffer.
    pub fn from_reader<R: Read>(mut reader: R, config: &StoreConfig) -> Result<Self> {
        let path = PathBuf::from("<memory>");
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| CarbonLensError::data_load(&path, e.to_string()))?;
        let hash = loader::hash_bytes(&bytes);
        let size = bytes.len() as u64;
        Self::build(path, &bytes, size, hash, config)
    }

    fn build(
        path: PathBuf,
        bytes: &[u8],
        size_bytes: u64,
        hash: String,
        config: &StoreConfig,
    ) -> Result<Self> {
        let table = loader::parse_bytes(bytes, config.delimiter)
            .map_err(|e| CarbonLensError::data_load(&path, e.to_string()))?;

        let entity_pos = find_header(&table, &config.entity_column).ok_or_else(|| {
            CarbonLensError::data_load(
                &path,
                format!("missing entity column '{}'", config.entity_column),
            )
        })?;
        let year_pos = find_header(&table, &config.year_column).ok_or_else(|| {
            CarbonLensError::data_load(&path, format!("missing year column '{}'", config.year_column))
        })?;

        // Pass 1: keep rows with a usable (entity, year) key
        let mut entity_names: Vec<String> = Vec::new();
        let mut entity_norms: Vec<String> = Vec::new();
        let mut entity_index: HashMap<String, usize> = HashMap::new();
        let mut seen_keys: HashSet<(usize, i32)> = HashSet::new();
        let mut kept: Vec<usize> = Vec::new();
        let mut row_entity = Vec::new();
        let mut row_year = Vec::new();
        let mut skipped = 0usize;

        for (raw_index, row) in table.rows.iter().enumerate() {
            let entity_cell = row[entity_pos].trim();
            let Some(year) = parse_year(&row[year_pos]).filter(|_| !is_null_value(entity_cell))
            else {
                skipped += 1;
                continue;
            };

            let norm = normalize_name(entity_cell);
            if norm.is_empty() {
                skipped += 1;
                continue;
            }
            let entity = match entity_index.get(&norm) {
                Some(&idx) => idx,
                None => {
                    let idx = entity_names.len();
                    entity_names.push(entity_cell.to_string());
                    entity_norms.push(norm.clone());
                    entity_index.insert(norm, idx);
                    idx
                }
            };

            if !seen_keys.insert((entity, year)) {
                debug!(entity = entity_cell, year, "Skipping duplicate row");
                skipped += 1;
                continue;
            }

            kept.push(raw_index);
            row_entity.push(entity);
            row_year.push(year);
        }

        let (Some(&min_year), Some(&max_year)) = (row_year.iter().min(), row_year.iter().max())
        else {
            return Err(CarbonLensError::data_load(
                &path,
                "no rows with a valid entity and year",
            ));
        };
        let year_span = YearSpan::new(min_year, max_year);

        // Pass 2: classify columns and materialize metrics
        let mut columns = Vec::with_capacity(table.headers.len());
        let mut metrics: IndexMap<String, Vec<Option<f64>>> = IndexMap::new();

        for (position, header) in table.headers.iter().enumerate() {
            let is_key = position == entity_pos || position == year_pos;
            let (kind, values, present_count) = classify_column(&table, position, &kept);

            let kind = if is_key { ColumnKind::Categorical } else { kind };
            let unit = if kind.is_numeric() {
                config
                    .units
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(header))
                    .map(|(_, unit)| unit.clone())
                    .or_else(|| infer_unit(header))
            } else {
                None
            };

            if kind.is_numeric() {
                if metrics.contains_key(header) {
                    warn!(column = %header, "Duplicate column header, keeping the first");
                    continue;
                }
                metrics.insert(header.clone(), values);
            }

            columns.push(ColumnMeta {
                name: header.clone(),
                position,
                kind,
                unit,
                present_count,
            });
        }

        if metrics.is_empty() {
            return Err(CarbonLensError::data_load(&path, "no numeric metric columns"));
        }

        let mut column_index = HashMap::new();
        let mut normalized_columns = HashMap::new();
        for (idx, column) in columns.iter().enumerate() {
            column_index.entry(column.name.clone()).or_insert(idx);
            normalized_columns.entry(normalize_name(&column.name)).or_insert(idx);
        }

        // Aliases apply only when their target exists
        let mut column_aliases = Vec::new();
        let configured = config
            .column_aliases
            .iter()
            .map(|(alias, target)| (alias.as_str(), target.as_str()));
        let builtin = COLUMN_ALIASES.iter().copied();
        for (alias, target) in configured.chain(builtin) {
            let alias = normalize_name(alias);
            let Some(&idx) = normalized_columns.get(&normalize_name(target)) else {
                continue;
            };
            if columns[idx].is_metric() && !column_aliases.iter().any(|(a, _)| *a == alias) {
                column_aliases.push((alias, idx));
            }
        }

        let mut entity_aliases = Vec::new();
        for (alias, target) in ENTITY_ALIASES {
            if let Some(&idx) = entity_index.get(&normalize_name(target)) {
                let alias = normalize_name(alias);
                if !entity_index.contains_key(&alias) {
                    entity_aliases.push((alias, idx));
                }
            }
        }

        let mut entity_rows: Vec<Vec<usize>> = vec![Vec::new(); entity_names.len()];
        for (row, &entity) in row_entity.iter().enumerate() {
            entity_rows[entity].push(row);
        }
        for rows in &mut entity_rows {
            rows.sort_by_key(|&row| row_year[row]);
        }

        if skipped > 0 {
            warn!(
                skipped,
                "Skipped rows with a blank entity, unparsable year or duplicate key"
            );
        }

        let source = SourceMetadata::new(
            path,
            hash,
            size_bytes,
            loader::format_name(table.delimiter).to_string(),
            row_year.len(),
            table.headers.len(),
            entity_names.len(),
            year_span,
            skipped,
        );

        info!(
            file = %source.file,
            rows = source.row_count,
            columns = source.column_count,
            metrics = metrics.len(),
            entities = source.entity_count,
            years = %year_span,
            "Loaded dataset"
        );

        Ok(Self {
            source,
            entity_column: table.headers[entity_pos].clone(),
            year_column: table.headers[year_pos].clone(),
            columns,
            column_index,
            column_aliases,
            metrics,
            row_entity,
            row_year,
            entity_names,
            entity_norms,
            entity_rows,
            entity_index,
            entity_aliases,
            year_span,
        })
    }

    /// Metadata about the loaded file.
    pub fn metadata(&self) -> &SourceMetadata {
        &self.source
    }

    /// Content hash identifying this snapshot.
    pub fn fingerprint(&self) -> &str {
        &self.source.hash
    }

    /// Number of rows kept.
    pub fn row_count(&self) -> usize {
        self.row_year.len()
    }

    pub fn entity_column(&self) -> &str {
        &self.entity_column
    }

    pub fn year_column(&self) -> &str {
        &self.year_column
    }

    /// All columns in file order.
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Numeric columns that can be aggregated.
    pub fn metric_columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter().filter(|c| c.is_metric())
    }

    /// Look up a column by its exact header.
    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.column_index.get(name).map(|&idx| &self.columns[idx])
    }

    /// Canonical entity names in first-seen order.
    pub fn entities(&self) -> &[String] {
        &self.entity_names
    }

    /// Observed `[min, max]` year span.
    pub fn year_span(&self) -> YearSpan {
        self.year_span
    }

    /// Resolve an entity name by exact normalized match, then alias.
    pub fn lookup_entity(&self, name: &str) -> Option<EntityMatch<'_>> {
        let norm = normalize_name(name);
        if let Some(&idx) = self.entity_index.get(&norm) {
            return Some(EntityMatch::Exact(&self.entity_names[idx]));
        }
        self.entity_aliases
            .iter()
            .find(|(alias, _)| *alias == norm)
            .map(|(_, idx)| EntityMatch::Alias(&self.entity_names[*idx]))
    }

    /// Canonical spelling of an entity, if known exactly or by alias.
    pub fn canonical_entity(&self, name: &str) -> Option<&str> {
        self.lookup_entity(name).map(|m| m.canonical())
    }

    /// `(normalized, canonical)` pairs for every entity, for fuzzy matching.
    pub fn entity_keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entity_norms
            .iter()
            .zip(&self.entity_names)
            .map(|(norm, name)| (norm.as_str(), name.as_str()))
    }

    /// Normalized phrases that name an entity: names and applicable aliases.
    pub fn entity_phrases(&self) -> impl Iterator<Item = &str> {
        self.entity_norms
            .iter()
            .map(String::as_str)
            .chain(self.entity_aliases.iter().map(|(alias, _)| alias.as_str()))
    }

    /// Normalized phrases that name a metric: column names and applicable aliases.
    pub fn metric_phrases(&self) -> impl Iterator<Item = String> + '_ {
        self.metric_columns()
            .map(|c| normalize_name(&c.name))
            .chain(self.column_aliases.iter().map(|(alias, _)| alias.clone()))
    }

    /// Rows for the selected entities within the span.
    ///
    /// Rows are grouped by entity (selection order, or first-seen order for
    /// [`EntitySelection::All`]) and sorted by year within each entity.
    /// Names not present in the store select nothing.
    pub fn rows_matching(&self, entities: &EntitySelection, years: &YearSpan) -> Vec<Row<'_>> {
        let entity_ids: Vec<usize> = match entities {
            EntitySelection::All => (0..self.entity_names.len()).collect(),
            EntitySelection::Only(names) => names
                .iter()
                .filter_map(|name| self.entity_index.get(&normalize_name(name)).copied())
                .collect(),
        };

        entity_ids
            .into_iter()
            .flat_map(|entity| self.entity_rows[entity].iter().copied())
            .filter(|&row| years.contains(self.row_year[row]))
            .map(|index| Row { store: self, index })
            .collect()
    }

    /// Resolve a metric fragment with the default fuzzy floor.
    pub fn resolve_column(&self, fragment: &str) -> Option<&ColumnMeta> {
        match self.match_column(fragment, DEFAULT_SIMILARITY_FLOOR) {
            ColumnMatch::Resolved { column, .. } => Some(column),
            _ => None,
        }
    }

    /// Match a free-form metric fragment against the metric columns.
    ///
    /// Candidates are scored by tier: exact 100, alias 90, exact or alias
    /// after dropping filler words 80, word-boundary substring 50, fuzzy
    /// `similarity * 40` when at or above `fuzzy_floor`. A tie at the best
    /// score is ambiguous.
    pub fn match_column(&self, fragment: &str, fuzzy_floor: f64) -> ColumnMatch<'_> {
        let norm = normalize_name(fragment);
        let stripped = strip_filler_words(&norm);
        let key = if stripped.is_empty() { norm.clone() } else { stripped.clone() };

        if key.is_empty() {
            return ColumnMatch::Unresolved {
                near_misses: self.near_misses(""),
            };
        }

        let mut best: HashMap<usize, (u32, MatchTier)> = HashMap::new();
        let mut offer = |idx: usize, score: u32, tier: MatchTier| {
            let entry = best.entry(idx).or_insert((score, tier));
            if score > entry.0 {
                *entry = (score, tier);
            }
        };

        for (idx, column) in self.columns.iter().enumerate() {
            if !column.is_metric() {
                continue;
            }
            let name = normalize_name(&column.name);

            if name == norm {
                offer(idx, 100, MatchTier::Exact);
            } else if !stripped.is_empty() && name == stripped {
                offer(idx, 80, MatchTier::FillerStripped);
            }

            // Every containing column scores the same: "co2" inside both
            // "coal_co2" and "co2_per_capita" is ambiguous, not a shortest-name win.
            if key != name && (contains_phrase(&name, &key) || contains_phrase(&key, &name)) {
                offer(idx, SUBSTRING_SCORE, MatchTier::Substring);
            }

            let sim = similarity(&key, &name);
            if sim >= fuzzy_floor && sim < 1.0 {
                offer(idx, (sim * 40.0).round() as u32, MatchTier::Fuzzy);
            }
        }

        for (alias, idx) in &self.column_aliases {
            if *alias == norm {
                offer(*idx, 90, MatchTier::Alias);
            } else if !stripped.is_empty() && *alias == stripped {
                offer(*idx, 80, MatchTier::FillerStripped);
            } else {
                let sim = similarity(&key, alias);
                if sim >= fuzzy_floor {
                    offer(*idx, (sim * 40.0).round() as u32, MatchTier::Fuzzy);
                }
            }
        }

        let Some(top) = best.values().map(|(score, _)| *score).max() else {
            return ColumnMatch::Unresolved {
                near_misses: self.near_misses(&key),
            };
        };

        let mut leaders: Vec<(usize, MatchTier)> = best
            .iter()
            .filter(|(_, (score, _))| *score == top)
            .map(|(idx, (_, tier))| (*idx, *tier))
            .collect();
        leaders.sort_by_key(|(idx, _)| *idx);

        match leaders.as_slice() {
            [(idx, tier)] => ColumnMatch::Resolved {
                column: &self.columns[*idx],
                tier: *tier,
            },
            _ => ColumnMatch::Ambiguous {
                candidates: leaders
                    .iter()
                    .map(|(idx, _)| self.columns[*idx].name.clone())
                    .collect(),
            },
        }
    }

    /// Metric columns closest to `key`, or the first few metrics when none is close.
    fn near_misses(&self, key: &str) -> Vec<String> {
        let mut scored: Vec<(f64, &ColumnMeta)> = self
            .metric_columns()
            .map(|column| {
                let name = normalize_name(&column.name);
                let mut score = similarity(key, &name);
                for (alias, idx) in &self.column_aliases {
                    if self.columns[*idx].name == column.name {
                        score = score.max(similarity(key, alias));
                    }
                }
                (score, column)
            })
            .filter(|(score, _)| !key.is_empty() && *score >= NEAR_MISS_SIMILARITY)
            .collect();

        if scored.is_empty() {
            return self
                .metric_columns()
                .take(NEAR_MISS_LIMIT)
                .map(|c| c.name.clone())
                .collect();
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.position.cmp(&b.1.position))
        });
        scored
            .into_iter()
            .take(NEAR_MISS_LIMIT)
            .map(|(_, c)| c.name.clone())
            .collect()
    }
}

fn find_header(table: &RawTable, wanted: &str) -> Option<usize> {
    table
        .headers
        .iter()
        .position(|h| h == wanted)
        .or_else(|| table.headers.iter().position(|h| h.eq_ignore_ascii_case(wanted)))
}

/// Parse a year cell. Accepts integers and integral floats such as `2020.0`.
fn parse_year(cell: &str) -> Option<i32> {
    let trimmed = cell.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    let value = trimmed.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64)
        .then_some(value as i32)
}

/// Classify one column over the kept rows.
///
/// Returns the kind, the parsed values (meaningful for numeric columns) and
/// the present count.
fn classify_column(
    table: &RawTable,
    position: usize,
    kept: &[usize],
) -> (ColumnKind, Vec<Option<f64>>, usize) {
    let mut values = Vec::with_capacity(kept.len());
    let mut numeric = true;
    let mut non_null = 0usize;

    for &raw in kept {
        let cell = table.rows[raw][position].trim();
        if is_null_value(cell) {
            values.push(None);
            continue;
        }
        non_null += 1;
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(Some(v)),
            Ok(_) => values.push(None),
            Err(_) => {
                numeric = false;
                values.push(None);
            }
        }
    }

    if numeric && non_null > 0 {
        let present = values.iter().filter(|v| v.is_some()).count();
        (ColumnKind::Numeric, values, present)
    } else {
        (ColumnKind::Categorical, Vec::new(), non_null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
country,year,iso_code,co2,co2_per_capita,methane,cumulative_co2
China,2019,CHN,10000,7.1,1200,200000
China,2020,CHN,10500,7.4,1250,210500
United States,2020,USA,4700,14.2,NA,420000
United States,2019,USA,5200,15.8,750,415300
Côte d'Ivoire,2020,CIV,,0.4,,300
,2020,XXX,1,1,1,1
India,not-a-year,IND,1,1,1,1
";

    fn sample_store() -> DatasetStore {
        DatasetStore::from_reader(SAMPLE.as_bytes(), &StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_load_counts_and_skips() {
        let store = sample_store();
        assert_eq!(store.row_count(), 5);
        assert_eq!(store.metadata().skipped_rows, 2);
        assert_eq!(store.entities(), &["China", "United States", "Côte d'Ivoire"]);
        assert_eq!(store.year_span(), YearSpan::new(2019, 2020));
        assert_eq!(store.metadata().format, "csv");
    }

    #[test]
    fn test_column_kinds() {
        let store = sample_store();
        assert_eq!(store.column("methane").unwrap().position, 5);
        assert!(store.column("CO2").is_none());
        assert_eq!(store.column("iso_code").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(store.column("country").unwrap().kind, ColumnKind::Categorical);
        assert_eq!(store.column("year").unwrap().kind, ColumnKind::Categorical);
        let co2 = store.column("co2").unwrap();
        assert!(co2.is_metric());
        assert_eq!(co2.unit.as_deref(), Some("million tonnes"));
        assert_eq!(co2.present_count, 4);
        let names: Vec<_> = store.metric_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["co2", "co2_per_capita", "methane", "cumulative_co2"]);
    }

    #[test]
    fn test_rows_matching_sorted_by_year() {
        let store = sample_store();
        let only = EntitySelection::Only(vec!["United States".to_string()]);
        let rows = store.rows_matching(&only, &store.year_span());
        let years: Vec<i32> = rows.iter().map(|r| r.year()).collect();
        assert_eq!(years, vec![2019, 2020]);
        assert_eq!(rows[1].value("methane"), None);
        assert_eq!(rows[0].value("co2"), Some(5200.0));
    }

    #[test]
    fn test_rows_matching_filters_years() {
        let store = sample_store();
        let rows = store.rows_matching(&EntitySelection::All, &YearSpan::new(2020, 2020));
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.year() == 2020));
    }

    #[test]
    fn test_missing_columns_fail_to_load() {
        let err = DatasetStore::from_reader("year,co2\n2020,1\n".as_bytes(), &StoreConfig::default())
            .unwrap_err();
        assert!(matches!(err, CarbonLensError::DataLoad { .. }));

        let err = DatasetStore::from_reader(
            "country,year,iso_code\nChina,2020,CHN\n".as_bytes(),
            &StoreConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no numeric metric"));
    }

    #[test]
    fn test_missing_file_fails_to_load() {
        let err = DatasetStore::load("/definitely/not/here.csv", &StoreConfig::default())
            .unwrap_err();
        assert!(matches!(err, CarbonLensError::DataLoad { .. }));
    }

    #[test]
    fn test_lookup_entity() {
        let store = sample_store();
        assert_eq!(store.canonical_entity("china"), Some("China"));
        assert_eq!(store.canonical_entity("CHINA"), Some("China"));
        assert_eq!(store.canonical_entity("cote d'ivoire"), Some("Côte d'Ivoire"));
        assert_eq!(store.canonical_entity("Ivory Coast"), Some("Côte d'Ivoire"));
        assert_eq!(
            store.lookup_entity("USA"),
            Some(EntityMatch::Alias("United States"))
        );
        // Target absent from this store
        assert_eq!(store.canonical_entity("uk"), None);
    }

    #[test]
    fn test_match_column_tiers() {
        let store = sample_store();
        let tier = |fragment: &str| match store.match_column(fragment, 0.8) {
            ColumnMatch::Resolved { column, tier } => Some((column.name.clone(), tier)),
            _ => None,
        };

        assert_eq!(tier("CO2"), Some(("co2".to_string(), MatchTier::Exact)));
        assert_eq!(tier("carbon dioxide"), Some(("co2".to_string(), MatchTier::Alias)));
        assert_eq!(tier("total co2 emissions"), Some(("co2".to_string(), MatchTier::FillerStripped)));
        assert_eq!(tier("per capita"), Some(("co2_per_capita".to_string(), MatchTier::Alias)));
        assert_eq!(tier("methan"), Some(("methane".to_string(), MatchTier::Fuzzy)));
        assert_eq!(tier("cumulative co2"), Some(("cumulative_co2".to_string(), MatchTier::Exact)));
    }

    #[test]
    fn test_match_column_unresolved_has_near_misses() {
        let store = sample_store();
        match store.match_column("rainfall", 0.8) {
            ColumnMatch::Unresolved { near_misses } => {
                assert!(!near_misses.is_empty());
                assert!(near_misses.len() <= NEAR_MISS_LIMIT);
            }
            other => panic!("expected unresolved, got {other:?}"),
        }
        assert!(store.resolve_column("iso_code").is_none());
    }

    #[test]
    fn test_match_column_ambiguous_substring() {
        let csv = "country,year,co2_per_capita,gas_per_capita\nChina,2020,1,2\n";
        let store = DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).unwrap();
        // "capita" is the same distance from both names
        match store.match_column("capita", 0.8) {
            ColumnMatch::Ambiguous { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_match_column_substring_never_picks_a_sector() {
        let csv = "country,year,cement_co2,co2_per_capita,coal_co2\nChina,2020,1,2,3\n";
        let store = DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).unwrap();
        match store.match_column("co2", 0.8) {
            ColumnMatch::Ambiguous { candidates } => {
                assert_eq!(candidates, vec!["cement_co2", "co2_per_capita", "coal_co2"]);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
        assert!(store.resolve_column("co2").is_none());

        // A single containing column still resolves
        assert_eq!(store.resolve_column("capita").unwrap().name, "co2_per_capita");
    }

    #[test]
    fn test_config_aliases_and_units() {
        let config = StoreConfig::default()
            .with_column_alias("footprint", "co2")
            .with_unit("co2", "Mt");
        let store = DatasetStore::from_reader(SAMPLE.as_bytes(), &config).unwrap();
        assert_eq!(store.resolve_column("footprint").unwrap().name, "co2");
        assert_eq!(store.column("co2").unwrap().unit.as_deref(), Some("Mt"));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2020"), Some(2020));
        assert_eq!(parse_year(" 2020.0 "), Some(2020));
        assert_eq!(parse_year("2020.5"), None);
        assert_eq!(parse_year("abc"), None);
    }
}
