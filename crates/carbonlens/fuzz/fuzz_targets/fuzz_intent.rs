//! Fuzz target for validation of untrusted intents.
//!
//! Intents arrive from a text generator and may hold anything. Validation
//! must reject or repair them, and execution of whatever passes must succeed
//! or fail with a structured error.

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use carbonlens::{execute, DatasetStore, QueryIntent, StoreConfig, TimeRange, Validator};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzIntent {
    metric: String,
    entities: Vec<String>,
    start: Option<i32>,
    end: Option<i32>,
    aggregation: String,
    comparison: bool,
}

fn store() -> Option<&'static DatasetStore> {
    static STORE: OnceLock<Option<DatasetStore>> = OnceLock::new();
    STORE
        .get_or_init(|| {
            let csv = "country,year,co2,methane\nChina,2010,1,2\nChina,2020,3,\nIndia,2015,5,6\n";
            DatasetStore::from_reader(csv.as_bytes(), &StoreConfig::default()).ok()
        })
        .as_ref()
}

fuzz_target!(|input: FuzzIntent| {
    let Some(store) = store() else {
        return;
    };

    let mut intent = QueryIntent::new(input.metric)
        .with_entities(input.entities)
        .with_aggregation(input.aggregation)
        .with_comparison(input.comparison);
    intent.time_range = Some(TimeRange {
        start: input.start,
        end: input.end,
    });

    if let Ok(validated) = Validator::new().validate(&intent, store) {
        let _ = execute(&validated, store);
    }
});
