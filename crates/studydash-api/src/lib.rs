//! # studydash-api
//!
//! HTTP API server for studydash.
//!
//! Email/password accounts with a JWT session cookie, plus read and
//! replace-all access to each user's dashboard document. Storage is reached
//! only through the repository traits from `studydash-core`, so the router
//! can be built over PostgreSQL ([`AppState::from_database`]) or any other
//! implementation.

pub mod auth;
pub mod config;
pub mod cookie;
pub mod error;
pub mod handlers;
pub mod password;
pub mod rate_limit;
pub mod seed;
pub mod session;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use studydash_core::{DashboardRepository, Result, UserRepository};
use studydash_db::{Database, PgDashboardRepository, PgUserRepository};

pub use config::ServerConfig;
pub use error::ApiError;
pub use rate_limit::GlobalRateLimiter;
pub use session::{Claims, SessionError, SessionKeys};

/// Generates UUIDv7 request IDs for time-ordered tracing.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub dashboards: Arc<dyn DashboardRepository>,
    pub sessions: Arc<SessionKeys>,
    pub config: Arc<ServerConfig>,
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        dashboards: Arc<dyn DashboardRepository>,
        config: ServerConfig,
    ) -> Result<Self> {
        let sessions = SessionKeys::new(&config.jwt_secret, config.session_ttl);
        let rate_limiter = rate_limit::build_rate_limiter(&config)?;
        Ok(Self {
            users,
            dashboards,
            sessions: Arc::new(sessions),
            config: Arc::new(config),
            rate_limiter,
        })
    }

    /// State backed by the PostgreSQL repositories of `db`.
    pub fn from_database(db: &Database, config: ServerConfig) -> Result<Self> {
        Self::new(
            Arc::new(PgUserRepository::new(db.pool.clone())),
            Arc::new(PgDashboardRepository::new(db.pool.clone())),
            config,
        )
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(subsystem = "api", panic = detail, "Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Server error" })),
    )
        .into_response()
}

fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Build the full router for `state`.
pub fn app(state: AppState) -> Router {
    use handlers::{auth, data, health};

    // Only the credential endpoints are throttled.
    let credentials = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ));

    let account = Router::new()
        .merge(credentials)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/profile", patch(auth::update_profile));

    let max_body = state.config.max_body_bytes;
    let origins = state.config.allowed_origins.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/auth", account)
        .route("/api/data", get(data::get_data).put(data::put_data))
        .fallback(health::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(origins))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .with_state(state)
}
