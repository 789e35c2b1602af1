//! Core traits for studydash storage abstractions.
//!
//! The server talks to storage only through these traits, so handlers can be
//! exercised against in-memory implementations in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository for account rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up an account by normalized email, including its password hash.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;

    /// Look up an account by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Insert a new account.
    ///
    /// Returns [`crate::Error::Conflict`] when the email (case-insensitive)
    /// is already registered.
    async fn create(&self, user: NewUser) -> Result<User>;

    /// Apply a profile update and return the updated account.
    ///
    /// An empty update returns the current row unchanged.
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User>;
}

// =============================================================================
// DASHBOARD REPOSITORY
// =============================================================================

/// Repository for the per-user dashboard document.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Fetch the stored document, `None` when the user never saved one.
    async fn get(&self, user_id: Uuid) -> Result<Option<DashboardDocument>>;

    /// Replace the stored document wholesale (insert or update).
    async fn upsert(&self, user_id: Uuid, doc: &DashboardDocument) -> Result<()>;
}
