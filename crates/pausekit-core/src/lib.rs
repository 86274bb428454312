//! # pausekit core
//!
//! Shared error types and unit helpers used by the pausekit crates.

pub mod error;
pub mod units;

pub use error::{Error, ProcessorError, Result};
pub use units::{format_number, to_mm_per_min, SpeedUnits};
