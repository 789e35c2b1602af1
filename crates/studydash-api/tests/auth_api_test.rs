//! Account endpoints driven through the router with in-memory storage.

mod helpers;

use std::time::Duration;

use axum::http::{header, Method, StatusCode};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use helpers::*;
use studydash_api::seed::ensure_demo_user;
use studydash_core::UserRepository;

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let response = send(&app.router, request(Method::GET, "/health", None, None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = test_app();
    let response = send(&app.router, request(Method::GET, "/api/nope", None, None)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error(), "Not found");
}

#[tokio::test]
async fn test_signup_creates_normalized_account() {
    let app = test_app();
    let response = signup(&app.router, "  Student@Example.COM ", "abcdef", " Jo ").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body["message"],
        "Account created successfully. Please sign in."
    );
    let user = &response.body["user"];
    assert_eq!(user["email"], "student@example.com");
    assert_eq!(user["name"], "Jo");
    assert_eq!(user["avatar"], "JO");
    assert_eq!(user["department"], "Not Specified");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password_hash").is_none());
    // Signup does not sign in.
    assert!(response.set_cookie().is_none());
}

#[tokio::test]
async fn test_signup_validation_messages() {
    let app = test_app();
    let cases = [
        (json!({ "email": "a@b.com", "name": "Jo" }), "Email and password are required"),
        (
            json!({ "email": "not-an-email", "password": "abcdef", "name": "Jo" }),
            "Please enter a valid email address",
        ),
        (
            json!({ "email": "a@b.com", "password": "abc", "name": "Jo" }),
            "Password must be at least 6 characters",
        ),
        (
            json!({ "email": "a@b.com", "password": "abcdef", "name": " J " }),
            "Name is required and must be at least 2 characters",
        ),
    ];

    for (body, message) in cases {
        let response = send(
            &app.router,
            request(Method::POST, "/api/auth/signup", Some(&body), None),
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(response.error(), message);
    }
    assert_eq!(app.users.count(), 0);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = test_app();
    signup(&app.router, "a@b.com", "abcdef", "Jo").await;
    let response = signup(&app.router, "A@B.com", "ghijkl", "Al").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error(), "An account with this email already exists");
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = test_app();
    signup(&app.router, "a@b.com", "abcdef", "Jo").await;

    let response = login(&app.router, "A@B.COM", "abcdef").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["name"], "Jo");

    let cookie = response.set_cookie().unwrap();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_login_failures() {
    let app = test_app();
    signup(&app.router, "a@b.com", "abcdef", "Jo").await;

    let unknown = login(&app.router, "x@b.com", "abcdef").await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        unknown.error(),
        "No account found with this email. Please sign up first."
    );

    let wrong = login(&app.router, "a@b.com", "abcdeg").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error(), "Incorrect password. Please try again.");
    assert!(wrong.set_cookie().is_none());

    let missing = send(
        &app.router,
        request(Method::POST, "/api/auth/login", Some(&json!({ "email": "a@b.com" })), None),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.error(), "Email and password are required");
}

#[tokio::test]
async fn test_me_requires_cookie() {
    let app = test_app();
    let response = send(&app.router, request(Method::GET, "/api/auth/me", None, None)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Authentication required");
    assert!(response.set_cookie().is_none());
}

#[tokio::test]
async fn test_me_returns_signed_in_user() {
    let app = test_app();
    let cookie = signed_in(&app.router, "a@b.com").await;
    let response = send(
        &app.router,
        request(Method::GET, "/api/auth/me", None, Some(&cookie)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["email"], "a@b.com");
}

#[tokio::test]
async fn test_bad_token_clears_cookie() {
    let app = test_app();
    let response = send(
        &app.router,
        request(Method::GET, "/api/auth/me", None, Some("auth_token=garbage")),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Invalid token");
    assert!(response.set_cookie().unwrap().starts_with("auth_token=;"));
}

#[tokio::test]
async fn test_expired_token() {
    let app = test_app();
    let created = signup(&app.router, "a@b.com", "abcdef", "Jo").await;
    let user_id: Uuid = created.body["user"]["id"].as_str().unwrap().parse().unwrap();

    let token = app
        .state
        .sessions
        .issue_at(user_id, Utc::now() - chrono::Duration::days(8))
        .unwrap();
    let response = send(
        &app.router,
        request(
            Method::GET,
            "/api/auth/me",
            None,
            Some(&format!("auth_token={}", token)),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "Session expired");
    assert!(response.set_cookie().is_some());
}

#[tokio::test]
async fn test_token_for_deleted_user() {
    let app = test_app();
    let cookie = signed_in(&app.router, "a@b.com").await;
    let me = send(&app.router, request(Method::GET, "/api/auth/me", None, Some(&cookie))).await;
    let user_id: Uuid = me.body["user"]["id"].as_str().unwrap().parse().unwrap();
    app.users.remove(user_id);

    let response = send(&app.router, request(Method::GET, "/api/auth/me", None, Some(&cookie))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), "User not found");
    assert!(response.set_cookie().is_some());
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = test_app();
    let response = send(&app.router, request(Method::POST, "/api/auth/logout", None, None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logged out");
    let cookie = response.set_cookie().unwrap();
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_profile_update_recomputes_avatar() {
    let app = test_app();
    let cookie = signed_in(&app.router, "a@b.com").await;

    let body = json!({ "name": "  maria  ", "studentId": "S-1", "department": "  " });
    let response = send(
        &app.router,
        request(Method::PATCH, "/api/auth/profile", Some(&body), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let user = &response.body["user"];
    assert_eq!(user["name"], "maria");
    assert_eq!(user["avatar"], "MA");
    assert_eq!(user["studentId"], "S-1");
    assert_eq!(user["department"], "Not Specified");

    // Blank student id clears it; blank name is ignored.
    let body = json!({ "name": " ", "studentId": "" });
    let response = send(
        &app.router,
        request(Method::PATCH, "/api/auth/profile", Some(&body), Some(&cookie)),
    )
    .await;
    let user = &response.body["user"];
    assert_eq!(user["name"], "maria");
    assert!(user.get("studentId").is_none());
}

#[tokio::test]
async fn test_empty_profile_update_returns_current_user() {
    let app = test_app();
    let cookie = signed_in(&app.router, "a@b.com").await;
    let response = send(
        &app.router,
        request(Method::PATCH, "/api/auth/profile", Some(&json!({})), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["name"], "Jo");
}

#[tokio::test]
async fn test_profile_requires_session() {
    let app = test_app();
    let response = send(
        &app.router,
        request(Method::PATCH, "/api/auth/profile", Some(&json!({ "name": "Al" })), None),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_credential_endpoints_are_rate_limited() {
    let app = test_app_with(test_config().with_rate_limit(2, Duration::from_secs(60)));

    assert_eq!(login(&app.router, "x@b.com", "abcdef").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app.router, "x@b.com", "abcdef").await.status, StatusCode::UNAUTHORIZED);
    let limited = login(&app.router, "x@b.com", "abcdef").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(!limited.error().is_empty());

    // Other routes are not throttled.
    let health = send(&app.router, request(Method::GET, "/health", None, None)).await;
    assert_eq!(health.status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_allows_dev_origin_with_credentials() {
    let app = test_app();
    let req = axum::http::Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/data")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app.router, req).await;
    assert_eq!(
        response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn test_demo_user_bootstrap_is_idempotent() {
    let app = test_app();
    assert!(ensure_demo_user(app.users.as_ref(), TEST_BCRYPT_COST).await.unwrap());
    assert!(!ensure_demo_user(app.users.as_ref(), TEST_BCRYPT_COST).await.unwrap());

    let demo = app
        .users
        .find_by_email("demo@university.edu")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(demo.user.name, "Demo Student");
    assert_eq!(demo.user.student_id.as_deref(), Some("STU2024001"));
    assert_eq!(demo.user.department, "Computer Science");
    assert_eq!(demo.user.avatar.as_deref(), Some("DS"));

    let response = login(&app.router, "demo@university.edu", "demo123").await;
    assert_eq!(response.status, StatusCode::OK);
}
