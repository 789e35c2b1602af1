//! # studydash-core
//!
//! Core types, traits, and abstractions for studydash.
//!
//! This crate provides the dashboard document model, the user-declared
//! property schema, the grading scale and the storage traits that the
//! server, database and sync crates depend on.

pub mod defaults;
pub mod error;
pub mod grading;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use grading::{cgpa, gpa, parse_credits, GpaSummary, GradeScale};
pub use models::*;
pub use traits::*;
