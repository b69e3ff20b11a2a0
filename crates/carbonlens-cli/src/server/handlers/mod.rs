//! API request handlers.

mod columns;
mod health;
mod query;
mod reload;

pub use columns::*;
pub use health::*;
pub use query::*;
pub use reload::*;
