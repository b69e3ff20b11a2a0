//! Candidate query intents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::names::normalize_name;

/// The fixed set of aggregations the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Average,
    Sum,
    Min,
    Max,
    Count,
    Latest,
    Trend,
}

impl Aggregation {
    pub const ALL: [Aggregation; 7] = [
        Aggregation::Average,
        Aggregation::Sum,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Count,
        Aggregation::Latest,
        Aggregation::Trend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Average => "average",
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
            Aggregation::Latest => "latest",
            Aggregation::Trend => "trend",
        }
    }

    /// Parse an aggregation name or common synonym.
    pub fn parse(text: &str) -> Option<Self> {
        let agg = match normalize_name(text).as_str() {
            "average" | "avg" | "mean" => Aggregation::Average,
            "sum" | "total" => Aggregation::Sum,
            "min" | "minimum" | "lowest" | "smallest" => Aggregation::Min,
            "max" | "maximum" | "highest" | "peak" | "largest" => Aggregation::Max,
            "count" | "number" | "how many" => Aggregation::Count,
            "latest" | "last" | "current" | "recent" | "most recent" => Aggregation::Latest,
            "trend" | "over time" | "evolution" | "history" | "timeline" | "series" => {
                Aggregation::Trend
            }
            _ => return None,
        };
        Some(agg)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregation::parse(s).ok_or_else(|| format!("Unknown aggregation: {}", s))
    }
}

/// A possibly open-ended year range as the user stated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<i32>,
    #[serde(default)]
    pub end: Option<i32>,
}

impl TimeRange {
    pub fn between(start: i32, end: i32) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A single calendar year.
    pub fn year(year: i32) -> Self {
        Self::between(year, year)
    }

    pub fn since(start: i32) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn until(end: i32) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Where a candidate intent came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentOrigin {
    /// Keyword and pattern matching.
    #[default]
    Rules,
    /// Parsed from a text generator's structured answer.
    Delegated,
    /// The generator was tried and failed; rules were used instead.
    Fallback { reason: String },
}

impl IntentOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, IntentOrigin::Fallback { .. })
    }
}

/// Candidate, untrusted description of what to compute.
///
/// Every field is free-form until the validator checks it against the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryIntent {
    /// Phrase naming the desired column. May be empty or misspelled.
    pub metric: String,
    /// Entity mentions in question order. Empty means all entities.
    pub entities: Vec<String>,
    /// Requested years, if any were mentioned.
    pub time_range: Option<TimeRange>,
    /// Aggregation name as text.
    pub aggregation: String,
    /// Whether a per-entity comparison was asked for.
    pub comparison: bool,
    /// How the intent was produced.
    #[serde(default)]
    pub origin: IntentOrigin,
}

impl QueryIntent {
    /// Create an intent for a metric with every other field defaulted.
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            aggregation: Aggregation::Latest.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn with_aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = aggregation.into();
        self
    }

    pub fn with_comparison(mut self, comparison: bool) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with_origin(mut self, origin: IntentOrigin) -> Self {
        self.origin = origin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_synonyms() {
        assert_eq!(Aggregation::parse("Average"), Some(Aggregation::Average));
        assert_eq!(Aggregation::parse("mean"), Some(Aggregation::Average));
        assert_eq!(Aggregation::parse("total"), Some(Aggregation::Sum));
        assert_eq!(Aggregation::parse("highest"), Some(Aggregation::Max));
        assert_eq!(Aggregation::parse("over time"), Some(Aggregation::Trend));
        assert_eq!(Aggregation::parse("median"), None);
        assert!("trend".parse::<Aggregation>().is_ok());
    }

    #[test]
    fn test_intent_builder_defaults() {
        let intent = QueryIntent::new("co2");
        assert_eq!(intent.aggregation, "latest");
        assert!(intent.entities.is_empty());
        assert!(intent.time_range.is_none());
        assert!(!intent.comparison);
        assert_eq!(intent.origin, IntentOrigin::Rules);
    }

    #[test]
    fn test_origin_serialization() {
        let origin = IntentOrigin::Fallback {
            reason: "timeout".to_string(),
        };
        let json = serde_json::to_value(&origin).unwrap();
        assert_eq!(json["kind"], "fallback");
        assert_eq!(json["reason"], "timeout");
    }
}
