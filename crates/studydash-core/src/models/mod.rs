//! Domain models for studydash.

pub mod document;
pub mod properties;
pub mod serde_util;
pub mod user;

pub use document::*;
pub use properties::*;
pub use user::*;
