//! Session authentication for private routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use studydash_core::defaults::SESSION_COOKIE;
use studydash_core::User;

use crate::error::ApiError;
use crate::AppState;

/// Extractor for authenticated requests.
///
/// Reads the `auth_token` cookie, verifies the token and loads the account.
/// A missing cookie is a plain 401; a token that is expired, forged, or
/// points at a deleted account also clears the cookie.
///
/// ```ignore
/// async fn me(CurrentUser(user): CurrentUser) -> Json<Value> {
///     Json(json!({ "user": user }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let secure = state.config.cookie_secure;
        let claims = state.sessions.verify(&token).map_err(|e| {
            debug!(
                subsystem = "api",
                component = "auth",
                reason = %e,
                "Session token rejected"
            );
            ApiError::session_rejected(e.to_string(), secure)
        })?;

        match state.users.find_by_id(claims.user_id).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                debug!(
                    subsystem = "api",
                    component = "auth",
                    user_id = %claims.user_id,
                    "Session for unknown user"
                );
                Err(ApiError::session_rejected("User not found", secure))
            }
            Err(e) => Err(ApiError::with_fallback(e, "Server error")),
        }
    }
}
