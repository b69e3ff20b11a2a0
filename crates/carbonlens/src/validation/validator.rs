//! Checks candidate intents against the store schema.

use tracing::debug;

use super::rejection::{Rejection, ValidationNote};
use super::validated::ValidatedIntent;
use crate::config::ValidationConfig;
use crate::intent::{Aggregation, QueryIntent};
use crate::store::names::{normalize_name, similarity};
use crate::store::{ColumnMatch, ColumnMeta, DatasetStore, EntityMatch, EntitySelection, MatchTier, YearSpan};

/// Lowest similarity at which an entity is still offered as a suggestion.
const SUGGESTION_SIMILARITY: f64 = 0.4;

/// Two similarities closer than this are a tie.
const TIE_EPSILON: f64 = 1e-9;

/// The boundary between untrusted intents and executable ones.
///
/// Metric and entity problems are rejected, never silently substituted
/// beyond an unambiguous fuzzy match. Only the aggregation has a default.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a candidate intent against a store snapshot.
    pub fn validate(
        &self,
        intent: &QueryIntent,
        store: &DatasetStore,
    ) -> Result<ValidatedIntent, Rejection> {
        let mut notes = Vec::new();

        let metric = self.resolve_metric(&intent.metric, store, &mut notes)?;
        let entities = self.resolve_entities(&intent.entities, store, &mut notes)?;
        let years = resolve_years(intent, store.year_span(), &mut notes)?;

        let aggregation = match Aggregation::parse(&intent.aggregation) {
            Some(agg) => agg,
            None => {
                if !intent.aggregation.trim().is_empty() {
                    notes.push(ValidationNote::AggregationDefaulted {
                        requested: intent.aggregation.clone(),
                    });
                }
                Aggregation::Latest
            }
        };

        let comparison = if intent.comparison && entities.names().len() < 2 {
            notes.push(ValidationNote::ComparisonCleared);
            false
        } else {
            intent.comparison
        };

        debug!(
            metric = %metric.name,
            entities = %entities,
            years = %years,
            aggregation = %aggregation,
            comparison,
            notes = notes.len(),
            "Validated intent"
        );

        Ok(ValidatedIntent::new(
            metric,
            entities,
            years,
            aggregation,
            comparison,
            notes,
            store.fingerprint().to_string(),
        ))
    }

    fn resolve_metric(
        &self,
        requested: &str,
        store: &DatasetStore,
        notes: &mut Vec<ValidationNote>,
    ) -> Result<ColumnMeta, Rejection> {
        let limit = self.config.max_suggestions;

        if requested.trim().is_empty() {
            let available = store.metric_columns().take(limit).map(|c| c.name.clone()).collect();
            return Err(Rejection::unknown_metric(
                "No metric was recognized in the question",
                available,
            ));
        }

        match store.match_column(requested, self.config.metric_similarity_floor) {
            ColumnMatch::Resolved { column, tier } => {
                if tier != MatchTier::Exact {
                    notes.push(ValidationNote::MetricMatched {
                        requested: requested.to_string(),
                        column: column.name.clone(),
                        tier: tier_name(tier).to_string(),
                    });
                }
                Ok(column.clone())
            }
            ColumnMatch::Ambiguous { mut candidates } => {
                candidates.truncate(limit);
                Err(Rejection::unknown_metric(
                    format!(
                        "Metric '{}' matches several columns equally well: {}",
                        requested,
                        candidates.join(", ")
                    ),
                    candidates,
                ))
            }
            ColumnMatch::Unresolved { mut near_misses } => {
                near_misses.truncate(limit);
                Err(Rejection::unknown_metric(
                    format!("Unknown metric '{}'", requested),
                    near_misses,
                ))
            }
        }
    }

    fn resolve_entities(
        &self,
        mentions: &[String],
        store: &DatasetStore,
        notes: &mut Vec<ValidationNote>,
    ) -> Result<EntitySelection, Rejection> {
        let mut resolved: Vec<String> = Vec::new();

        for mention in mentions.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
            let canonical = match store.lookup_entity(mention) {
                Some(EntityMatch::Exact(name)) => name.to_string(),
                Some(EntityMatch::Alias(name)) => {
                    notes.push(ValidationNote::EntityAlias {
                        requested: mention.to_string(),
                        entity: name.to_string(),
                    });
                    name.to_string()
                }
                None => self.fuzzy_entity(mention, store, notes)?,
            };

            if resolved.contains(&canonical) {
                notes.push(ValidationNote::DuplicateEntity { entity: canonical });
            } else {
                resolved.push(canonical);
            }
        }

        if resolved.is_empty() {
            Ok(EntitySelection::All)
        } else {
            Ok(EntitySelection::Only(resolved))
        }
    }

    fn fuzzy_entity(
        &self,
        mention: &str,
        store: &DatasetStore,
        notes: &mut Vec<ValidationNote>,
    ) -> Result<String, Rejection> {
        let norm = normalize_name(mention);
        let mut scored: Vec<(f64, &str)> = store
            .entity_keys()
            .map(|(key, name)| (similarity(&norm, key), name))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let best = scored.first().map(|(score, _)| *score).unwrap_or(0.0);
        if best >= self.config.entity_similarity_floor {
            let leaders: Vec<&str> = scored
                .iter()
                .take_while(|(score, _)| (best - score).abs() < TIE_EPSILON)
                .map(|(_, name)| *name)
                .collect();

            if let [only] = leaders.as_slice() {
                notes.push(ValidationNote::EntityFuzzy {
                    requested: mention.to_string(),
                    entity: only.to_string(),
                    similarity: best,
                });
                return Ok(only.to_string());
            }

            return Err(Rejection::unknown_entity(
                format!(
                    "Entity '{}' is equally close to {}",
                    mention,
                    leaders.join(", ")
                ),
                leaders
                    .iter()
                    .take(self.config.max_suggestions)
                    .map(|s| s.to_string())
                    .collect(),
            ));
        }

        let suggestions = scored
            .iter()
            .filter(|(score, _)| *score >= SUGGESTION_SIMILARITY)
            .take(self.config.max_suggestions)
            .map(|(_, name)| name.to_string())
            .collect();
        Err(Rejection::unknown_entity(
            format!("Unknown entity '{}'", mention),
            suggestions,
        ))
    }
}

/// Complete, order and clamp the requested years to the data span.
fn resolve_years(
    intent: &QueryIntent,
    data: YearSpan,
    notes: &mut Vec<ValidationNote>,
) -> Result<YearSpan, Rejection> {
    let Some(range) = intent.time_range.filter(|r| !r.is_unbounded()) else {
        return Ok(data);
    };

    let mut start = range.start.unwrap_or(data.start);
    let mut end = range.end.unwrap_or(data.end);

    if start > end {
        if range.start.is_some() && range.end.is_some() {
            notes.push(ValidationNote::YearsSwapped {
                start: end,
                end: start,
            });
            std::mem::swap(&mut start, &mut end);
        } else {
            return Err(Rejection::empty_range(
                format!(
                    "No data for the requested years; the dataset covers {}",
                    data
                ),
                data,
            ));
        }
    }

    let requested = YearSpan::new(start, end);
    let Some(applied) = requested.intersect(&data) else {
        return Err(Rejection::empty_range(
            format!(
                "No data for {}; the dataset covers {}",
                requested, data
            ),
            data,
        ));
    };

    if applied != requested {
        notes.push(ValidationNote::YearsClamped { requested, applied });
    }
    Ok(applied)
}

fn tier_name(tier: MatchTier) -> &'static str {
    match tier {
        MatchTier::Exact => "exact",
        MatchTier::Alias => "alias",
        MatchTier::FillerStripped => "filler-stripped",
        MatchTier::Substring => "substring",
        MatchTier::Fuzzy => "fuzzy",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::intent::TimeRange;
    use crate::validation::RejectionKind;

    fn store() -> DatasetStore {
        let csv = "\
country,year,co2,co2_per_capita,gas_per_capita,methane
China,2010,100,1,0.1,10
China,2023,200,2,0.2,20
United States,2010,300,3,0.3,30
United States,2023,400,4,0.4,40
Côte d'Ivoire,2023,5,0.5,0.05,1
Austria,2023,60,7,0.7,3
Australia,2023,400,15,1.5,100
Gambia,2023,1,0.2,0.01,1
Zambia,2023,7,0.4,0.02,4
";
        DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).unwrap()
    }

    fn validate(intent: QueryIntent) -> Result<ValidatedIntent, Rejection> {
        Validator::new().validate(&intent, &store())
    }

    #[test]
    fn test_exact_resolution() {
        let v = validate(
            QueryIntent::new("co2")
                .with_entities(["china"])
                .with_aggregation("average"),
        )
        .unwrap();
        assert_eq!(v.metric().name, "co2");
        assert_eq!(v.entities(), &EntitySelection::Only(vec!["China".to_string()]));
        assert_eq!(v.years(), YearSpan::new(2010, 2023));
        assert_eq!(v.aggregation(), Aggregation::Average);
        assert!(v.notes().is_empty());
    }

    #[test]
    fn test_case_and_accent_insensitive() {
        let a = validate(QueryIntent::new("co2").with_entities(["china"])).unwrap();
        let b = validate(QueryIntent::new("co2").with_entities(["China"])).unwrap();
        assert_eq!(a.entities(), b.entities());

        let c = validate(QueryIntent::new("co2").with_entities(["cote d'ivoire"])).unwrap();
        assert_eq!(c.entities().names(), &["Côte d'Ivoire".to_string()]);
        assert!(c.notes().is_empty());
    }

    #[test]
    fn test_alias_and_fuzzy_entities() {
        let v = validate(QueryIntent::new("co2").with_entities(["USA", "Chna"])).unwrap();
        assert_eq!(
            v.entities().names(),
            &["United States".to_string(), "China".to_string()]
        );
        assert!(matches!(v.notes()[0], ValidationNote::EntityAlias { .. }));
        assert!(matches!(v.notes()[1], ValidationNote::EntityFuzzy { .. }));
    }

    #[test]
    fn test_unknown_entity_rejects() {
        let err = validate(QueryIntent::new("co2").with_entities(["Narnia"])).unwrap_err();
        assert_eq!(err.kind, RejectionKind::UnknownEntity);
        assert!(err.detail.contains("Narnia"));
    }

    #[test]
    fn test_fuzzy_tie_rejects() {
        // One edit from both Gambia and Zambia.
        let err = validate(QueryIntent::new("co2").with_entities(["Xambia"])).unwrap_err();
        assert_eq!(err.kind, RejectionKind::UnknownEntity);
        assert_eq!(err.suggestions, vec!["Gambia", "Zambia"]);

        let v = validate(QueryIntent::new("co2").with_entities(["Austrlia"])).unwrap();
        assert_eq!(v.entities().names(), &["Australia".to_string()]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let v = validate(QueryIntent::new("co2").with_entities(["china", "China", "USA", "united states"]))
            .unwrap();
        assert_eq!(v.entities().names().len(), 2);
    }

    #[test]
    fn test_unknown_metric_never_substitutes() {
        let err = validate(QueryIntent::new("rainfall")).unwrap_err();
        assert_eq!(err.kind, RejectionKind::UnknownMetric);
        assert!(!err.suggestions.is_empty());

        let err = validate(QueryIntent::new("")).unwrap_err();
        assert_eq!(err.kind, RejectionKind::UnknownMetric);
    }

    #[test]
    fn test_ambiguous_metric_rejects() {
        let err = validate(QueryIntent::new("capita")).unwrap_err();
        assert_eq!(err.kind, RejectionKind::UnknownMetric);
    }

    #[test]
    fn test_sector_columns_do_not_stand_in_for_co2() {
        let csv = "country,year,cement_co2,co2_per_capita,coal_co2\nChina,2020,1,2,3\n";
        let store = DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).unwrap();
        let err = Validator::new()
            .validate(&QueryIntent::new("co2"), &store)
            .unwrap_err();
        assert_eq!(err.kind, RejectionKind::UnknownMetric);
        assert_eq!(err.suggestions, vec!["cement_co2", "co2_per_capita", "coal_co2"]);
    }

    #[test]
    fn test_year_clamping() {
        let v = validate(QueryIntent::new("co2").with_time_range(TimeRange::between(2015, 2030)))
            .unwrap();
        assert_eq!(v.years(), YearSpan::new(2015, 2023));
        assert!(v
            .notes()
            .iter()
            .any(|n| matches!(n, ValidationNote::YearsClamped { .. })));
    }

    #[test]
    fn test_years_out_of_range_reject() {
        let err = validate(QueryIntent::new("co2").with_time_range(TimeRange::year(2150)))
            .unwrap_err();
        assert_eq!(err.kind, RejectionKind::EmptyRange);
        assert_eq!(err.applied_years, Some(YearSpan::new(2010, 2023)));

        let err = validate(QueryIntent::new("co2").with_time_range(TimeRange::since(2150)))
            .unwrap_err();
        assert_eq!(err.kind, RejectionKind::EmptyRange);
    }

    #[test]
    fn test_inverted_and_open_years() {
        let v = validate(QueryIntent::new("co2").with_time_range(TimeRange::between(2020, 2012)))
            .unwrap();
        assert_eq!(v.years(), YearSpan::new(2012, 2020));

        let v = validate(QueryIntent::new("co2").with_time_range(TimeRange::until(2015))).unwrap();
        assert_eq!(v.years(), YearSpan::new(2010, 2015));
    }

    #[test]
    fn test_aggregation_defaults_to_latest() {
        let v = validate(QueryIntent::new("co2").with_aggregation("median")).unwrap();
        assert_eq!(v.aggregation(), Aggregation::Latest);
        assert_eq!(
            v.notes(),
            &[ValidationNote::AggregationDefaulted {
                requested: "median".to_string()
            }]
        );
    }

    #[test]
    fn test_comparison_needs_two_entities() {
        let v = validate(
            QueryIntent::new("co2")
                .with_entities(["china", "China"])
                .with_comparison(true),
        )
        .unwrap();
        assert!(!v.comparison());

        let v = validate(
            QueryIntent::new("co2")
                .with_entities(["china", "usa"])
                .with_comparison(true),
        )
        .unwrap();
        assert!(v.comparison());
    }

    #[test]
    fn test_fingerprint_is_carried() {
        let store = store();
        let v = Validator::new()
            .validate(&QueryIntent::new("co2"), &store)
            .unwrap();
        assert_eq!(v.store_fingerprint(), store.fingerprint());
        assert!(v.entities().is_all());
    }
}
