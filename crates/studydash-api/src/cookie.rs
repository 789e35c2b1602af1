//! The `auth_token` session cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;

use studydash_core::defaults::{SESSION_COOKIE, SESSION_TTL_SECS};

/// HttpOnly, `SameSite=Lax`, `Path=/`, seven-day Max-Age.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Same attributes as [`session_cookie`], expired, so browsers drop it.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
