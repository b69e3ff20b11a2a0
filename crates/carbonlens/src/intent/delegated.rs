//! Intent extraction delegated to a text generator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::rules::RuleBasedExtractor;
use super::types::{IntentOrigin, QueryIntent, TimeRange};
use super::IntentExtractor;
use crate::config::ExtractionStrategy;
use crate::error::Result;
use crate::llm::{parse_json_response, prompts, Generation, TextGenerator};
use crate::store::DatasetStore;

/// Extractor that asks a [`TextGenerator`] for a structured intent.
///
/// The rule-based result is always computed first. It fills any field the
/// generator leaves out, and replaces the whole answer when the generator
/// fails, times out or returns something that is not a JSON object.
pub struct DelegatedExtractor {
    generator: Arc<dyn TextGenerator>,
    rules: RuleBasedExtractor,
    timeout: Duration,
}

impl DelegatedExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            generator,
            rules: RuleBasedExtractor::new()?,
            timeout,
        })
    }

    /// Name of the underlying generator.
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    fn degrade(&self, rules: QueryIntent, reason: String) -> QueryIntent {
        warn!(
            generator = self.generator.name(),
            reason = %reason,
            "Delegated extraction degraded to rules"
        );
        rules.with_origin(IntentOrigin::Fallback { reason })
    }
}

#[async_trait]
impl IntentExtractor for DelegatedExtractor {
    async fn extract(&self, question: &str, store: &DatasetStore) -> QueryIntent {
        let rules = self.rules.extract_intent(question, store);
        let prompt = prompts::intent_extraction_prompt(question, store);

        let text = match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await
        {
            Err(_) => {
                let reason = format!("generation timed out after {:?}", self.timeout);
                return self.degrade(rules, reason);
            }
            Ok(Generation::Failure(reason)) => return self.degrade(rules, reason),
            Ok(Generation::Success(text)) => text,
        };

        match parse_json_response::<Value>(&text) {
            Ok(Value::Object(fields)) => {
                debug!(generator = self.generator.name(), "Parsed delegated intent");
                merge_with_rules(&fields, rules)
            }
            Ok(_) => self.degrade(rules, "response is not a JSON object".to_string()),
            Err(e) => self.degrade(rules, e.to_string()),
        }
    }

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Delegated
    }
}

/// Build an intent from the generator's fields, back-filling from rules.
fn merge_with_rules(fields: &serde_json::Map<String, Value>, rules: QueryIntent) -> QueryIntent {
    let metric = string_field(fields, "metric").unwrap_or(rules.metric);

    // An empty list from the generator must not widen a question that named entities.
    let entities = match string_list(fields.get("entities")) {
        Some(list) if !list.is_empty() => list,
        _ => rules.entities,
    };

    let nested = fields.get("time_range").and_then(Value::as_object);
    let start = year_field(fields.get("start_year"))
        .or_else(|| nested.and_then(|r| year_field(r.get("start"))));
    let end = year_field(fields.get("end_year"))
        .or_else(|| nested.and_then(|r| year_field(r.get("end"))));
    let time_range = match (start, end) {
        (None, None) => rules.time_range,
        (start, end) => Some(TimeRange { start, end }),
    };

    let aggregation = string_field(fields, "aggregation").unwrap_or(rules.aggregation);
    let comparison = fields
        .get("comparison")
        .and_then(Value::as_bool)
        .unwrap_or(rules.comparison);

    QueryIntent {
        metric,
        entities,
        time_range,
        aggregation,
        comparison,
        origin: IntentOrigin::Delegated,
    }
}

fn string_field(fields: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accept a list of strings or a single string.
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

/// Accept a year as a JSON integer or a numeric string.
fn year_field(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::llm::MockGenerator;

    fn store() -> DatasetStore {
        let csv = "country,year,co2,methane\nChina,2010,1,2\nChina,2020,3,4\nIndia,2020,5,6\n";
        DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).unwrap()
    }

    fn extractor(mock: MockGenerator) -> DelegatedExtractor {
        DelegatedExtractor::new(Arc::new(mock), Duration::from_secs(15)).unwrap()
    }

    #[tokio::test]
    async fn test_structured_response_is_used() {
        let mock = MockGenerator::replying(
            r#"```json
{"metric": "methane", "entities": ["India"], "start_year": 2015, "end_year": null,
 "aggregation": "max", "comparison": false}
```"#,
        );
        let intent = extractor(mock).extract("methane peak for india", &store()).await;
        assert_eq!(intent.metric, "methane");
        assert_eq!(intent.entities, vec!["India"]);
        assert_eq!(intent.time_range, Some(TimeRange::since(2015)));
        assert_eq!(intent.aggregation, "max");
        assert_eq!(intent.origin, IntentOrigin::Delegated);
    }

    #[tokio::test]
    async fn test_missing_fields_are_backfilled() {
        let mock = MockGenerator::replying(r#"{"aggregation": "average", "entities": []}"#);
        let intent = extractor(mock)
            .extract("co2 of China from 2010 to 2020", &store())
            .await;
        assert_eq!(intent.metric, "co2");
        assert_eq!(intent.entities, vec!["china"]);
        assert_eq!(intent.time_range, Some(TimeRange::between(2010, 2020)));
        assert_eq!(intent.aggregation, "average");
        assert_eq!(intent.origin, IntentOrigin::Delegated);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_rules() {
        let intent = extractor(MockGenerator::failing("quota exceeded"))
            .extract("average co2 of China", &store())
            .await;
        assert_eq!(intent.metric, "co2");
        assert_eq!(intent.aggregation, "average");
        assert_eq!(
            intent.origin,
            IntentOrigin::Fallback {
                reason: "quota exceeded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_garbage_falls_back_to_rules() {
        for reply in ["I think China emits a lot.", "[1, 2, 3]", ""] {
            let intent = extractor(MockGenerator::replying(reply))
                .extract("co2 of India", &store())
                .await;
            assert!(intent.origin.is_fallback(), "reply {reply:?} should degrade");
            assert_eq!(intent.entities, vec!["india"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back_to_rules() {
        let mock = MockGenerator::replying(r#"{"metric": "methane"}"#)
            .with_delay(Duration::from_secs(60));
        let extractor = DelegatedExtractor::new(Arc::new(mock), Duration::from_secs(1)).unwrap();
        let intent = extractor.extract("co2 of India", &store()).await;
        assert_eq!(intent.metric, "co2");
        assert!(intent.origin.is_fallback());
    }

    #[test]
    fn test_year_field_accepts_strings() {
        assert_eq!(year_field(Some(&Value::from(2015))), Some(2015));
        assert_eq!(year_field(Some(&Value::from("2016"))), Some(2016));
        assert_eq!(year_field(Some(&Value::Null)), None);
        assert_eq!(year_field(None), None);
    }
}
