//! Normalize fitness device exports (FIT, GPX, TCX) into one [`Activity`]
//! summary plus its location [`Point`]s.

pub mod error;
pub mod parsers;
pub mod types;

pub use error::ActivityError;
pub use parsers::{ActivityFormat, parse_activity, parse_activity_bytes};
pub use types::{Activity, Point};
