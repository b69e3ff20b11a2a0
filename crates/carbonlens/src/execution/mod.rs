//! Execution: validated intents to numbers.

mod engine;
mod result;

pub use engine::{execute, ExecutionError};
pub use result::{AppliedFilters, EntityValue, ExecutionResult, ResultValue, YearValue};
