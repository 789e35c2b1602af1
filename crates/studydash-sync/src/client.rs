//! HTTP client for the dashboard API.
//!
//! Keeps the `auth_token` cookie in reqwest's cookie store, so a successful
//! [`HttpClient::login`] authenticates every later call.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use studydash_core::{
    DashboardDocument, Error, LoginRequest, ProfileUpdateRequest, Result, SignupRequest, User,
};

use crate::transport::DashboardApi;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest-backed client with a persistent cookie jar.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Client for the server at `base_url` (e.g. `http://localhost:4000`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured reqwest client. It must have a cookie store for
    /// the session to stick.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send and turn any non-2xx answer into the matching [`Error`] variant,
    /// using the server's `{error}` message when it sent one.
    async fn send(&self, op: &'static str, request: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        debug!(
            subsystem = "sync",
            component = "http_client",
            op,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request complete"
        );
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        warn!(
            subsystem = "sync",
            component = "http_client",
            op,
            status = status.as_u16(),
            error = %message,
            "Request rejected"
        );
        Err(Error::from_status(status.as_u16(), message))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(op, request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Create an account. Does not sign in.
    pub async fn signup(&self, request: &SignupRequest) -> Result<User> {
        let envelope: UserEnvelope = self
            .json("signup", self.request(Method::POST, "/api/auth/signup").json(request))
            .await?;
        Ok(envelope.user)
    }

    /// Sign in; the session cookie lands in the client's jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let body = LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        let envelope: UserEnvelope = self
            .json("login", self.request(Method::POST, "/api/auth/login").json(&body))
            .await?;
        Ok(envelope.user)
    }

    pub async fn logout(&self) -> Result<()> {
        self.send("logout", self.request(Method::POST, "/api/auth/logout")).await?;
        Ok(())
    }

    /// The signed-in user, or [`Error::Unauthorized`].
    pub async fn me(&self) -> Result<User> {
        let envelope: UserEnvelope = self
            .json("me", self.request(Method::GET, "/api/auth/me"))
            .await?;
        Ok(envelope.user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdateRequest) -> Result<User> {
        let envelope: UserEnvelope = self
            .json("update_profile", self.request(Method::PATCH, "/api/auth/profile").json(update))
            .await?;
        Ok(envelope.user)
    }
}

#[async_trait]
impl DashboardApi for HttpClient {
    async fn load(&self) -> Result<DashboardDocument> {
        self.json("load", self.request(Method::GET, "/api/data")).await
    }

    async fn save(&self, doc: &DashboardDocument) -> Result<()> {
        self.send("save", self.request(Method::PUT, "/api/data").json(doc)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpClient::new("http://localhost:4000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:4000");
    }

    #[test]
    fn test_error_body_decodes() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Session expired"}"#).unwrap();
        assert_eq!(body.error, "Session expired");
    }
}
