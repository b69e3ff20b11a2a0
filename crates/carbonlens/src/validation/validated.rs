//! The trusted, schema-checked intent.

use serde::Serialize;

use super::rejection::ValidationNote;
use crate::intent::Aggregation;
use crate::store::{ColumnMeta, EntitySelection, YearSpan};

/// An intent every field of which has been checked against one store snapshot.
///
/// Only the validator can build one. Executing it needs no further lookups
/// or text parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedIntent {
    metric: ColumnMeta,
    entities: EntitySelection,
    years: YearSpan,
    aggregation: Aggregation,
    comparison: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<ValidationNote>,
    #[serde(skip)]
    fingerprint: String,
}

impl ValidatedIntent {
    pub(crate) fn new(
        metric: ColumnMeta,
        entities: EntitySelection,
        years: YearSpan,
        aggregation: Aggregation,
        comparison: bool,
        notes: Vec<ValidationNote>,
        fingerprint: String,
    ) -> Self {
        Self {
            metric,
            entities,
            years,
            aggregation,
            comparison,
            notes,
            fingerprint,
        }
    }

    /// The resolved metric column.
    pub fn metric(&self) -> &ColumnMeta {
        &self.metric
    }

    pub fn entities(&self) -> &EntitySelection {
        &self.entities
    }

    /// Concrete year span inside the data.
    pub fn years(&self) -> YearSpan {
        self.years
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn comparison(&self) -> bool {
        self.comparison
    }

    /// Repairs made while validating.
    pub fn notes(&self) -> &[ValidationNote] {
        &self.notes
    }

    /// Fingerprint of the store this intent was validated against.
    pub fn store_fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Key for caller-side memoisation of results.
    ///
    /// Two intents with the same key produce identical results on the same
    /// store snapshot.
    pub fn cache_key(&self) -> String {
        let entities = match &self.entities {
            EntitySelection::All => "*".to_string(),
            EntitySelection::Only(names) => names.join("\u{1f}"),
        };
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.fingerprint,
            self.metric.name,
            entities,
            self.years,
            self.aggregation,
            self.comparison
        )
    }

    /// Canonical one-line description of the computation.
    pub fn describe(&self) -> String {
        let mut text = format!(
            "{}({}) | entities: {} | years: {}",
            self.aggregation, self.metric.name, self.entities, self.years
        );
        if self.comparison {
            text.push_str(" | per entity");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ColumnKind;

    fn intent(entities: EntitySelection, comparison: bool) -> ValidatedIntent {
        ValidatedIntent::new(
            ColumnMeta {
                name: "co2".to_string(),
                position: 2,
                kind: ColumnKind::Numeric,
                unit: Some("million tonnes".to_string()),
                present_count: 10,
            },
            entities,
            YearSpan::new(2010, 2023),
            Aggregation::Average,
            comparison,
            Vec::new(),
            "sha256:abc".to_string(),
        )
    }

    #[test]
    fn test_describe() {
        let single = intent(EntitySelection::Only(vec!["China".into()]), false);
        assert_eq!(single.describe(), "average(co2) | entities: China | years: 2010-2023");

        let pair = intent(
            EntitySelection::Only(vec!["China".into(), "India".into()]),
            true,
        );
        assert_eq!(
            pair.describe(),
            "average(co2) | entities: China, India | years: 2010-2023 | per entity"
        );
    }

    #[test]
    fn test_cache_key_distinguishes_selections() {
        let all = intent(EntitySelection::All, false);
        let china = intent(EntitySelection::Only(vec!["China".into()]), false);
        assert_ne!(all.cache_key(), china.cache_key());
        assert_eq!(china.cache_key(), china.clone().cache_key());
        assert!(china.cache_key().starts_with("sha256:abc|co2|"));
    }
}
