//! G-Code instruction model and stream plumbing
//!
//! This module provides:
//! - Line parsing into instructions with tolerant numeric parameters
//! - A builder for generated lines
//! - Machine state tracking across a layer sequence
//! - Splitting documents into layers
//! - The layer processor pipeline

pub mod command;
pub mod layers;
pub mod pipeline;
pub mod state;

pub use command::*;
pub use layers::*;
pub use pipeline::*;
pub use state::*;
