//! # studydash-sync
//!
//! The client-side data layer for studydash.
//!
//! - [`DashboardStore`]: the in-memory document and its validated mutators
//! - [`SemesterScope`]: the "current semester" filter for views
//! - [`DataSync`]: session switching, demo seeding and debounced autosave
//! - [`HttpClient`]: reqwest transport with a cookie-backed session
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studydash_sync::{CourseInput, DataSync, HttpClient, SyncConfig};
//!
//! let client = Arc::new(HttpClient::new("http://localhost:4000")?);
//! let user = client.login("demo@university.edu", "demo123").await?;
//!
//! let sync = DataSync::new(client.clone(), SyncConfig::from_env());
//! sync.switch_user(&user).await?;
//! sync.mutate(|store| store.add_course(CourseInput {
//!     name: "Compilers".into(),
//!     ..Default::default()
//! })).await?;
//!
//! sync.logout().await?;
//! client.logout().await?;
//! ```

pub mod client;
pub mod config;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod scope;
pub mod seed;
pub mod store;
pub mod sync;
pub mod transport;

pub use client::HttpClient;
pub use config::SyncConfig;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockDashboardApi;
pub use scope::{SemesterScope, UPCOMING_EVENT_LIMIT};
pub use seed::{demo_document, needs_seed};
pub use store::{
    CourseInput, CoursePatch, DashboardStore, EventInput, EventPatch, FileInput, GradeInput,
    GradePatch, IdGenerator, MindSpaceInput, MindSpacePatch, PropertyInput, UNKNOWN_COURSE,
};
pub use sync::{DataSync, LoadOutcome, SyncEvent, SyncState};
pub use transport::DashboardApi;
