//! Property-based tests for the query pipeline.
//!
//! These tests use proptest to generate random questions and intents and
//! verify that the pipeline keeps its guarantees for all of them:
//!
//! 1. **No panics**: extraction, validation and execution accept any input
//! 2. **No substitution**: an unknown metric is always rejected
//! 3. **Determinism**: the same validated intent always yields the same result
//! 4. **Clamping**: applied years always lie inside the data span
//!
//! # Running Property Tests
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p carbonlens --test property_tests
//! ```

use proptest::prelude::*;

use carbonlens::intent::RuleBasedExtractor;
use carbonlens::{
    execute, Aggregation, DatasetStore, QueryIntent, RejectionKind, StoreConfig, TimeRange,
    Validator, YearSpan,
};

const ENTITIES: &[&str] = &["China", "India", "Brazil", "Côte d'Ivoire", "United States"];

fn store() -> DatasetStore {
    let mut csv = String::from("country,year,co2,co2_per_capita,methane\n");
    for (i, entity) in ENTITIES.iter().enumerate() {
        for year in 1990..=2023 {
            let base = (i as f64 + 1.0) * 100.0 + (year - 1990) as f64;
            // Leave a gap in methane for every fifth year.
            let methane = if year % 5 == 0 { String::new() } else { format!("{}", base / 10.0) };
            csv.push_str(&format!("{},{},{},{},{}\n", entity, year, base, base / 50.0, methane));
        }
    }
    DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).expect("fixture loads")
}

// =============================================================================
// Test Strategies
// =============================================================================

/// Arbitrary printable text, the common case for questions.
fn question_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ,.?'\\-]{0,120}",
        "(average|total|max|trend|latest) (co2|methane|rainfall) (of|in|for) (China|India|Narnia)( since [12][0-9]{3})?",
        any::<String>(),
    ]
}

/// Metric names built from letters that appear in no column or alias.
fn unknown_metric() -> impl Strategy<Value = String> {
    "[qxjkvwz]{5,12}"
}

fn aggregation_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("average".to_string()),
        Just("sum".to_string()),
        Just("min".to_string()),
        Just("max".to_string()),
        Just("count".to_string()),
        Just("latest".to_string()),
        Just("trend".to_string()),
        "[a-z]{0,10}",
    ]
}

fn entity_subset() -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(ENTITIES.to_vec(), 0..=ENTITIES.len())
        .prop_map(|names| names.into_iter().map(str::to_string).collect())
}

fn time_range() -> impl Strategy<Value = Option<TimeRange>> {
    prop_oneof![
        Just(None),
        (1900i32..2200, 1900i32..2200).prop_map(|(a, b)| Some(TimeRange::between(a, b))),
        (1900i32..2200).prop_map(|y| Some(TimeRange::since(y))),
        (1900i32..2200).prop_map(|y| Some(TimeRange::until(y))),
    ]
}

/// Randomly change the case of each character.
fn recase(name: &str, mask: &[bool]) -> String {
    name.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| {
            if *upper {
                c.to_uppercase().collect::<String>()
            } else {
                c.to_lowercase().collect::<String>()
            }
        })
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn extraction_and_validation_never_panic(question in question_like()) {
        let store = store();
        let extractor = RuleBasedExtractor::new().expect("patterns compile");
        let intent = extractor.extract_intent(&question, &store);

        if let Ok(validated) = Validator::new().validate(&intent, &store) {
            let _ = execute(&validated, &store);
        }
    }

    #[test]
    fn unknown_metric_is_always_rejected(metric in unknown_metric(), entities in entity_subset()) {
        let store = store();
        let intent = QueryIntent::new(metric).with_entities(entities);
        let rejection = Validator::new().validate(&intent, &store).unwrap_err();
        prop_assert_eq!(rejection.kind, RejectionKind::UnknownMetric);
    }

    #[test]
    fn execution_is_idempotent(
        entities in entity_subset(),
        aggregation in aggregation_text(),
        range in time_range(),
        comparison in any::<bool>(),
    ) {
        let store = store();
        let mut intent = QueryIntent::new("methane")
            .with_entities(entities)
            .with_aggregation(aggregation)
            .with_comparison(comparison);
        intent.time_range = range;

        if let Ok(validated) = Validator::new().validate(&intent, &store) {
            let first = execute(&validated, &store);
            let second = execute(&validated, &store);
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn applied_years_stay_inside_data(a in 1800i32..2300, b in 1800i32..2300) {
        let store = store();
        let data = store.year_span();
        let intent = QueryIntent::new("co2").with_time_range(TimeRange::between(a, b));

        match Validator::new().validate(&intent, &store) {
            Ok(validated) => {
                let years = validated.years();
                prop_assert!(data.contains(years.start) && data.contains(years.end));
                prop_assert!(YearSpan::new(a, b).intersect(&data).is_some());
            }
            Err(rejection) => {
                prop_assert_eq!(rejection.kind, RejectionKind::EmptyRange);
                prop_assert!(YearSpan::new(a, b).intersect(&data).is_none());
                prop_assert_eq!(rejection.applied_years, Some(data));
            }
        }
    }

    #[test]
    fn entity_case_does_not_matter(
        index in 0..ENTITIES.len(),
        mask in proptest::collection::vec(any::<bool>(), 1..8),
    ) {
        let store = store();
        let name = ENTITIES[index];
        let intent = QueryIntent::new("co2").with_entities([recase(name, &mask)]);
        let validated = Validator::new().validate(&intent, &store).expect("resolves");
        prop_assert_eq!(validated.entities().names(), &[name.to_string()][..]);
        prop_assert!(validated.notes().is_empty());
    }

    #[test]
    fn trend_over_many_entities_is_unsupported(entities in entity_subset()) {
        let store = store();
        let count = entities.len();
        let intent = QueryIntent::new("co2")
            .with_entities(entities)
            .with_aggregation(Aggregation::Trend.as_str());
        let validated = Validator::new().validate(&intent, &store).expect("valid intent");

        let result = execute(&validated, &store);
        if count == 1 {
            prop_assert!(result.is_ok());
        } else {
            let err = result.unwrap_err();
            prop_assert_eq!(err.rejection().map(|r| r.kind), Some(RejectionKind::UnsupportedCombination));
        }
    }
}
