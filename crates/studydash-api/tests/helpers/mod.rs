//! Shared fixtures for the API integration tests: in-memory repositories,
//! a router factory and request helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use studydash_api::{app, AppState, ServerConfig};
use studydash_core::{
    DashboardDocument, DashboardRepository, Error, NewUser, ProfileUpdate, Result, User,
    UserCredentials, UserRepository,
};

pub const TEST_SECRET: &str = "integration-test-secret";

/// bcrypt's minimum cost, so tests stay fast.
pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<Vec<UserCredentials>>,
}

impl InMemoryUsers {
    pub fn remove(&self, id: Uuid) {
        self.rows.lock().unwrap().retain(|c| c.user.id != id);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let email = email.to_lowercase();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn create(&self, new: NewUser) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|c| c.user.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(Error::Conflict("email already registered".to_string()));
        }
        let user = User {
            id: Uuid::now_v7(),
            email: new.email,
            name: new.name,
            student_id: new.student_id,
            department: new.department,
            avatar: Some(new.avatar),
            created_at: Utc::now(),
        };
        rows.push(UserCredentials {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|c| c.user.id == id)
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;
        if let Some(name) = update.name {
            row.user.name = name;
        }
        if let Some(student_id) = update.student_id {
            row.user.student_id = student_id;
        }
        if let Some(department) = update.department {
            row.user.department = department;
        }
        if let Some(avatar) = update.avatar {
            row.user.avatar = Some(avatar);
        }
        Ok(row.user.clone())
    }
}

#[derive(Default)]
pub struct InMemoryDashboards {
    docs: Mutex<HashMap<Uuid, DashboardDocument>>,
    failing: AtomicBool,
}

impl InMemoryDashboards {
    /// Make every call fail with a database-class error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stored(&self, user_id: Uuid) -> Option<DashboardDocument> {
        self.docs.lock().unwrap().get(&user_id).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Internal("storage offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for InMemoryDashboards {
    async fn get(&self, user_id: Uuid) -> Result<Option<DashboardDocument>> {
        self.check()?;
        Ok(self.docs.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: Uuid, doc: &DashboardDocument) -> Result<()> {
        self.check()?;
        self.docs.lock().unwrap().insert(user_id, doc.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUsers>,
    pub dashboards: Arc<InMemoryDashboards>,
}

pub fn test_config() -> ServerConfig {
    ServerConfig::with_secret(TEST_SECRET).with_bcrypt_cost(TEST_BCRYPT_COST)
}

pub fn test_app() -> TestApp {
    test_app_with(test_config())
}

pub fn test_app_with(config: ServerConfig) -> TestApp {
    let users = Arc::new(InMemoryUsers::default());
    let dashboards = Arc::new(InMemoryDashboards::default());
    let state = AppState::new(users.clone(), dashboards.clone(), config).unwrap();
    TestApp {
        router: app(state.clone()),
        state,
        users,
        dashboards,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    /// The `auth_token=...` pair from `Set-Cookie`, ready for a `Cookie`
    /// header.
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookie()
            .and_then(|c| c.split(';').next())
            .map(str::to_string)
    }
}

pub fn request(method: Method, uri: &str, body: Option<&Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn signup(router: &Router, email: &str, password: &str, name: &str) -> TestResponse {
    let body = serde_json::json!({ "email": email, "password": password, "name": name });
    send(router, request(Method::POST, "/api/auth/signup", Some(&body), None)).await
}

pub async fn login(router: &Router, email: &str, password: &str) -> TestResponse {
    let body = serde_json::json!({ "email": email, "password": password });
    send(router, request(Method::POST, "/api/auth/login", Some(&body), None)).await
}

/// Sign up and sign in; returns the cookie to send on later requests.
pub async fn signed_in(router: &Router, email: &str) -> String {
    let created = signup(router, email, "abcdef", "Jo").await;
    assert_eq!(created.status, StatusCode::CREATED);
    let response = login(router, email, "abcdef").await;
    assert_eq!(response.status, StatusCode::OK);
    response.session_cookie().unwrap()
}
