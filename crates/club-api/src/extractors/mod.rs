//! Axum extractors for request handling
//!
//! Custom extractors for validated bodies and typed path parameters.

mod path;
mod validated;

pub use path::{MemberPath, StatusQuery};
pub use validated::ValidatedJson;
