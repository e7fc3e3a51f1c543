//! # goftar-core
//!
//! Core types, traits, and abstractions for the Goftar Core Bridge.
//!
//! This crate provides the error taxonomy, shared data model, and trait
//! seams that the other bridge crates depend on. It performs no I/O.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
