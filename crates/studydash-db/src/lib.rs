//! # studydash-db
//!
//! PostgreSQL persistence layer for studydash.
//!
//! This crate provides:
//! - Connection pool management
//! - `PgUserRepository` for accounts
//! - `PgDashboardRepository` for the per-user dashboard document
//!
//! ## Example
//!
//! ```rust,ignore
//! use studydash_db::{Database, DashboardRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/studydash").await?;
//!     db.migrate().await?;
//!
//!     let doc = db.dashboards.get(user_id).await?.unwrap_or_default();
//!     println!("{} courses", doc.courses.len());
//!     Ok(())
//! }
//! ```

pub mod dashboard;
pub mod pool;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use studydash_core::*;

pub use dashboard::PgDashboardRepository;
pub use pool::{connect_pool, log_pool_state, PoolSettings};
pub use users::PgUserRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Account repository.
    pub users: PgUserRepository,
    /// Dashboard document repository.
    pub dashboards: PgDashboardRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            dashboards: PgDashboardRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with the default pool sizing.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, &PoolSettings::default()).await
    }

    pub async fn connect_with(url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = connect_pool(url, settings).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
