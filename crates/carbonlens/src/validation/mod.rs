//! Validation: the only path from a candidate intent to an executable one.

mod rejection;
mod validated;
mod validator;

pub use rejection::{Rejection, RejectionKind, ValidationNote};
pub use validated::ValidatedIntent;
pub use validator::Validator;
