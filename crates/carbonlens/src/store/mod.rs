//! Dataset store: loading, schema and the read-only query surface.

mod column;
mod dataset;
mod handle;
mod loader;
pub mod names;
mod selection;
mod source;

pub use column::{infer_unit, ColumnKind, ColumnMeta};
pub use dataset::{ColumnMatch, DatasetStore, EntityMatch, MatchTier, Row};
pub use handle::StoreHandle;
pub use loader::is_null_value;
pub use selection::{EntitySelection, YearSpan};
pub use source::SourceMetadata;
