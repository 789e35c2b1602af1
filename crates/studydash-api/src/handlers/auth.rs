//! Account endpoints under `/api/auth`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use tracing::{info, warn};

use studydash_core::{Error, LoginRequest, ProfileUpdateRequest, SignupRequest};

use crate::auth::CurrentUser;
use crate::cookie::{removal_cookie, session_cookie};
use crate::error::ApiError;
use crate::password::{hash_password, verify_password};
use crate::AppState;

const DUPLICATE_EMAIL: &str = "An account with this email already exists";
const UNKNOWN_EMAIL: &str = "No account found with this email. Please sign up first.";
const WRONG_PASSWORD: &str = "Incorrect password. Please try again.";

/// `POST /api/auth/signup`. Creates the account without signing in.
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    const FAILED: &str = "Registration failed";
    let Json(body) = payload?;
    let signup = body
        .validate()
        .map_err(|e| ApiError::with_fallback(e, FAILED))?;

    let existing = state
        .users
        .find_by_email(&signup.email)
        .await
        .map_err(|e| ApiError::with_fallback(e, FAILED))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    let hash = hash_password(signup.password.clone(), state.config.bcrypt_cost)
        .await
        .map_err(|e| ApiError::with_fallback(e, FAILED))?;

    // A concurrent signup can still win the unique index.
    let user = state
        .users
        .create(signup.into_new_user(hash))
        .await
        .map_err(|e| match e {
            Error::Conflict(_) => ApiError::Conflict(DUPLICATE_EMAIL.to_string()),
            other => ApiError::with_fallback(other, FAILED),
        })?;

    info!(
        subsystem = "api",
        component = "auth",
        op = "signup",
        user_id = %user.id,
        "Account created"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created successfully. Please sign in.",
            "user": user,
        })),
    ))
}

/// `POST /api/auth/login`. Sets the session cookie on success.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    const FAILED: &str = "Login failed";
    let Json(body) = payload?;
    let (email, password) = body
        .validate()
        .map_err(|e| ApiError::with_fallback(e, FAILED))?;

    let credentials = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::with_fallback(e, FAILED))?
        .ok_or_else(|| ApiError::Unauthorized(UNKNOWN_EMAIL.to_string()))?;

    let matches = verify_password(password, credentials.password_hash)
        .await
        .map_err(|e| ApiError::with_fallback(e, FAILED))?;
    if !matches {
        warn!(
            subsystem = "api",
            component = "auth",
            op = "login",
            user_id = %credentials.user.id,
            "Password mismatch"
        );
        return Err(ApiError::Unauthorized(WRONG_PASSWORD.to_string()));
    }

    let token = state
        .sessions
        .issue(credentials.user.id)
        .map_err(|e| ApiError::with_fallback(e, FAILED))?;

    info!(
        subsystem = "api",
        component = "auth",
        op = "login",
        user_id = %credentials.user.id,
        "Signed in"
    );
    Ok((
        jar.add(session_cookie(token, state.config.cookie_secure)),
        Json(json!({ "user": credentials.user })),
    ))
}

/// `POST /api/auth/logout`. Always succeeds.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    (
        jar.add(removal_cookie(state.config.cookie_secure)),
        Json(json!({ "message": "Logged out" })),
    )
}

/// `GET /api/auth/me`.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "user": user }))
}

/// `PATCH /api/auth/profile`. An update with nothing to change returns the
/// current account untouched.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let update = body.normalize();
    if update.is_empty() {
        return Ok(Json(json!({ "user": user })));
    }

    let updated = state
        .users
        .update_profile(user.id, update)
        .await
        .map_err(|e| ApiError::with_fallback(e, "Update failed"))?;

    info!(
        subsystem = "api",
        component = "auth",
        op = "update_profile",
        user_id = %updated.id,
        "Profile updated"
    );
    Ok(Json(json!({ "user": updated })))
}
