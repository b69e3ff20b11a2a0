//! Structured rejections and repair notes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::YearSpan;

/// Why a query cannot be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// No column matches the metric, or several match equally well.
    UnknownMetric,
    /// An entity mention matches no dataset entity.
    UnknownEntity,
    /// The requested years do not overlap the data.
    EmptyRange,
    /// The intent is well formed but the operation cannot apply to it.
    UnsupportedCombination,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::UnknownMetric => "unknown_metric",
            RejectionKind::UnknownEntity => "unknown_entity",
            RejectionKind::EmptyRange => "empty_range",
            RejectionKind::UnsupportedCombination => "unsupported_combination",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing refusal with enough detail to rephrase the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind}: {detail}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub detail: String,
    /// Near-miss names the caller may have meant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Years that were, or could be, used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_years: Option<YearSpan>,
}

impl Rejection {
    pub fn new(kind: RejectionKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            suggestions: Vec::new(),
            applied_years: None,
        }
    }

    pub fn unknown_metric(detail: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::new(RejectionKind::UnknownMetric, detail).with_suggestions(suggestions)
    }

    pub fn unknown_entity(detail: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::new(RejectionKind::UnknownEntity, detail).with_suggestions(suggestions)
    }

    /// Requested years miss the data; `available` is the dataset span.
    pub fn empty_range(detail: impl Into<String>, available: YearSpan) -> Self {
        Self::new(RejectionKind::EmptyRange, detail).with_years(available)
    }

    pub fn unsupported(detail: impl Into<String>) -> Self {
        Self::new(RejectionKind::UnsupportedCombination, detail)
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_years(mut self, years: YearSpan) -> Self {
        self.applied_years = Some(years);
        self
    }
}

/// A repair the validator made to a candidate intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationNote {
    /// The metric resolved by alias, filler stripping, substring or fuzzy match.
    MetricMatched {
        requested: String,
        column: String,
        tier: String,
    },
    /// An entity was named by a known alias.
    EntityAlias { requested: String, entity: String },
    /// A misspelled entity was replaced by its closest match.
    EntityFuzzy {
        requested: String,
        entity: String,
        similarity: f64,
    },
    /// An entity was mentioned more than once.
    DuplicateEntity { entity: String },
    /// Start and end years were given in reverse.
    YearsSwapped { start: i32, end: i32 },
    /// Years outside the data were cut off.
    YearsClamped { requested: YearSpan, applied: YearSpan },
    /// The aggregation was not recognized and `latest` was used.
    AggregationDefaulted { requested: String },
    /// Comparison needs two or more entities.
    ComparisonCleared,
}

impl fmt::Display for ValidationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationNote::MetricMatched {
                requested,
                column,
                tier,
            } => write!(f, "Interpreted '{}' as column '{}' ({} match)", requested, column, tier),
            ValidationNote::EntityAlias { requested, entity } => {
                write!(f, "Interpreted '{}' as '{}'", requested, entity)
            }
            ValidationNote::EntityFuzzy {
                requested,
                entity,
                similarity,
            } => write!(
                f,
                "Interpreted '{}' as '{}' (similarity {:.2})",
                requested, entity, similarity
            ),
            ValidationNote::DuplicateEntity { entity } => {
                write!(f, "'{}' was mentioned more than once", entity)
            }
            ValidationNote::YearsSwapped { start, end } => {
                write!(f, "Swapped reversed years to {}-{}", start, end)
            }
            ValidationNote::YearsClamped { requested, applied } => write!(
                f,
                "Requested years {} were limited to the available data, {}",
                requested, applied
            ),
            ValidationNote::AggregationDefaulted { requested } => {
                write!(f, "Unrecognized aggregation '{}', showing the latest value", requested)
            }
            ValidationNote::ComparisonCleared => {
                write!(f, "Comparison needs at least two entities and was ignored")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_serialization() {
        let rejection = Rejection::unknown_entity("Unknown entity 'Narnia'", vec!["Namibia".into()]);
        let json = serde_json::to_value(&rejection).unwrap();
        assert_eq!(json["kind"], "unknown_entity");
        assert_eq!(json["suggestions"][0], "Namibia");
        assert!(json.get("applied_years").is_none());

        let empty = Rejection::empty_range("No data", YearSpan::new(1750, 2023));
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["applied_years"]["end"], 2023);
        assert!(json.get("suggestions").is_none());
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::unsupported("trend needs one entity");
        assert_eq!(rejection.to_string(), "unsupported_combination: trend needs one entity");
    }

    #[test]
    fn test_note_display() {
        let note = ValidationNote::YearsClamped {
            requested: YearSpan::new(2015, 2030),
            applied: YearSpan::new(2015, 2023),
        };
        assert!(note.to_string().contains("2015-2030"));
        assert!(note.to_string().contains("2015-2023"));
    }
}
