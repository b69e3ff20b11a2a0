//! Fuzz target for dataset loading.
//!
//! The loader must never panic on malformed files, whatever the delimiter,
//! quoting or encoding.

#![no_main]

use carbonlens::{DatasetStore, StoreConfig};
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    if let Ok(mut temp_file) = tempfile::NamedTempFile::new() {
        if temp_file.write_all(data).is_ok() {
            if let Ok(store) = DatasetStore::load(temp_file.path(), &StoreConfig::default()) {
                let _ = store.metric_columns().count();
                let _ = store.rows_matching(&carbonlens::EntitySelection::All, &store.year_span());
            }
        }
    }

    let _ = DatasetStore::from_reader(data, &StoreConfig::default());
});
