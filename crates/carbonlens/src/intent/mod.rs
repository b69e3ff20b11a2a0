//! Intent extraction: free text to a candidate [`QueryIntent`].
//!
//! Two interchangeable strategies share the [`IntentExtractor`] trait.
//! Extraction never fails; anything it cannot make sense of is left empty
//! for the validator to judge.

mod delegated;
mod rules;
mod types;

use async_trait::async_trait;

use crate::config::ExtractionStrategy;
use crate::store::DatasetStore;

pub use delegated::DelegatedExtractor;
pub use rules::RuleBasedExtractor;
pub use types::{Aggregation, IntentOrigin, QueryIntent, TimeRange};

/// Converts a question into a candidate intent.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    /// Extract an intent. Always returns some intent, possibly empty.
    async fn extract(&self, question: &str, store: &DatasetStore) -> QueryIntent;

    /// Which strategy this extractor implements.
    fn strategy(&self) -> ExtractionStrategy;
}
