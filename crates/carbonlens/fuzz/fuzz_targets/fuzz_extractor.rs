//! Fuzz target for rule-based extraction.
//!
//! Arbitrary question text goes through extraction, validation and
//! execution; none of the stages may panic.

#![no_main]

use std::sync::OnceLock;

use carbonlens::intent::RuleBasedExtractor;
use carbonlens::{execute, DatasetStore, StoreConfig, Validator};
use libfuzzer_sys::fuzz_target;

const FIXTURE: &str = "\
country,year,co2,co2_per_capita,methane
China,2010,9000,6.7,1100
China,2023,10300,7.3,1200
United States,2023,4850,14.2,700
Côte d'Ivoire,2023,13,0.5,
World,2023,37000,4.6,8000
";

fn store() -> Option<&'static DatasetStore> {
    static STORE: OnceLock<Option<DatasetStore>> = OnceLock::new();
    STORE
        .get_or_init(|| DatasetStore::from_reader(FIXTURE.as_bytes(), &StoreConfig::default()).ok())
        .as_ref()
}

fuzz_target!(|data: &[u8]| {
    let (Some(store), Ok(extractor)) = (store(), RuleBasedExtractor::new()) else {
        return;
    };

    let question = String::from_utf8_lossy(data);
    let intent = extractor.extract_intent(&question, store);
    if let Ok(validated) = Validator::new().validate(&intent, store) {
        let _ = execute(&validated, store);
        let _ = validated.describe();
    }
});
