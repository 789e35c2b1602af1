//! The per-user dashboard document at `/api/data`.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use studydash_core::DashboardDocument;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/data`. Users who never saved get the empty document.
pub async fn get_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DashboardDocument>, ApiError> {
    let doc = state
        .dashboards
        .get(user.id)
        .await
        .map_err(|e| ApiError::with_fallback(e, "Failed to load data"))?
        .unwrap_or_default();
    Ok(Json(doc))
}

/// `PUT /api/data`. Replaces the stored document wholesale; last write wins.
pub async fn put_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<DashboardDocument>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(doc) = payload?;
    let start = Instant::now();
    state
        .dashboards
        .upsert(user.id, &doc)
        .await
        .map_err(|e| ApiError::with_fallback(e, "Failed to save data"))?;

    debug!(
        subsystem = "api",
        component = "data",
        op = "put",
        user_id = %user.id,
        item_count = doc.courses.len()
            + doc.calendar_events.len()
            + doc.mind_space_items.len()
            + doc.files.len()
            + doc.grades.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Dashboard saved"
    );
    Ok(Json(json!({ "message": "Saved" })))
}
