//! CarbonLens: natural-language questions over per-country emissions data.
//!
//! A question goes through three stages before it becomes a number:
//!
//! - **Extraction**: free text to a candidate [`QueryIntent`], by rules or by
//!   a delegated text generator with a rule-based fallback
//! - **Validation**: the candidate is checked against the store schema and
//!   either becomes a [`ValidatedIntent`] or a structured [`Rejection`]
//! - **Execution**: a deterministic aggregation over the in-memory
//!   [`DatasetStore`], never an evaluation of user text
//!
//! # Example
//!
//! ```no_run
//! use carbonlens::{QueryPipeline, StoreConfig, StoreHandle};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StoreHandle::open("owid-co2-data.csv", StoreConfig::default())?;
//! let pipeline = QueryPipeline::rule_based(store)?;
//!
//! let answer = pipeline.answer("average CO2 of China since 2010").await?;
//! println!("{}", answer.summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod intent;
pub mod llm;
pub mod pipeline;
pub mod store;
pub mod summary;
pub mod validation;

pub use config::{ExtractionConfig, ExtractionStrategy, PipelineConfig, StoreConfig, ValidationConfig};
pub use error::{CarbonLensError, Result};
pub use execution::{execute, ExecutionError, ExecutionResult, ResultValue};
pub use intent::{Aggregation, IntentExtractor, IntentOrigin, QueryIntent, TimeRange};
pub use pipeline::{QueryError, QueryPipeline};
pub use store::{ColumnMeta, DatasetStore, EntitySelection, SourceMetadata, StoreHandle, YearSpan};
pub use summary::{QueryAnswer, Statistics};
pub use validation::{Rejection, RejectionKind, ValidatedIntent, Validator};
