//! Safety validator: exact preservation of critical data and
//! non-fabrication of enhanced narratives.

pub mod preservation;
pub mod readability;
pub mod retention;
pub mod tokens;
pub mod types;
pub mod validator;

pub use types::*;
pub use validator::*;
