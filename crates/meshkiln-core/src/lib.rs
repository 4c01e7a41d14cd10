//! Meshkiln Core Library
//!
//! This crate provides the shared error type and artifact classification
//! used by the meshkiln exporter crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
