//! The seam between the sync engine and the server.

use async_trait::async_trait;

use studydash_core::{DashboardDocument, Result};

/// Whole-document load and save for the signed-in session.
///
/// The session itself (cookie) is owned by the implementation; calls made
/// without one fail with [`studydash_core::Error::Unauthorized`].
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// `GET /api/data`. A user with no stored document gets the empty default.
    async fn load(&self) -> Result<DashboardDocument>;

    /// `PUT /api/data`. Replaces the stored document wholesale.
    async fn save(&self, doc: &DashboardDocument) -> Result<()>;
}
