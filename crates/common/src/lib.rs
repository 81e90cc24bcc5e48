//! Shared error plumbing and filesystem helpers used across the skillbox crates.

pub mod error;
pub mod fs;

pub use error::{Error, FromMessage, Result};
