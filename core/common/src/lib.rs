//! Common utilities and types shared across the credvault crates.
//!
//! This module provides the workspace error type and the small validated
//! value types that cross crate boundaries.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{SensitiveString, Username};
