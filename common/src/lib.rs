//! Voyage Common Types
//!
//! Shared currency vocabulary used by the Voyage pricing layer: currency
//! codes, currency pairs, monetary amounts with minor-unit helpers, and
//! UTC time utilities.

pub mod monetary;
pub mod time;

pub use monetary::*;
pub use time::*;
