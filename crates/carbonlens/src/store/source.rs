//! Metadata about the loaded dataset file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::selection::YearSpan;

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents. Doubles as the store fingerprint.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows kept (excluding header and skipped rows).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// Number of distinct entities.
    pub entity_count: usize,
    /// Observed year span.
    pub year_span: YearSpan,
    /// Rows dropped for a blank entity, unparsable year or duplicate key.
    pub skipped_rows: usize,
    /// When the store was built.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
        entity_count: usize,
        year_span: YearSpan,
        skipped_rows: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            entity_count,
            year_span,
            skipped_rows,
            loaded_at: Utc::now(),
        }
    }
}
