//! OAuth2 client-credentials token cache for the 1NCE management API.
//!
//! A single [`BearerToken`] is held per cache. [`TokenCache::get_token`] hands
//! out the cached token while it is more than [`REFRESH_BUFFER`] away from
//! expiry and refreshes it otherwise. The state lock is held across the
//! refresh, so callers racing on an empty or stale cache share one token
//! endpoint round trip. A failed refresh leaves the previous state untouched.

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use sms_core::{BearerToken, SmsError, TokenProvider};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tokens are refreshed once they are this close to expiry.
pub const REFRESH_BUFFER: Duration = Duration::seconds(300);
/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: i64 = 3600;
/// Largest `expires_in` magnitude accepted from the token endpoint (one year).
pub const MAX_EXPIRES_IN: i64 = 365 * 24 * 3600;

const TOKEN_PATH: &str = "/management-api/oauth/token";

/// Username/password pair used for the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// `Authorization` header value: `Basic base64(username:password)`.
    pub fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    /// Integer or fractional seconds.
    expires_in: Option<f64>,
}

/// Single-slot bearer token cache backed by the 1NCE token endpoint.
#[derive(Debug)]
pub struct TokenCache {
    credentials: Credentials,
    token_url: String,
    http: reqwest::Client,
    state: Mutex<Option<BearerToken>>,
}

impl TokenCache {
    /// `base_url` is the API origin, e.g. `https://api.1nce.com`.
    pub fn new(credentials: Credentials, base_url: &str, http: reqwest::Client) -> Self {
        Self {
            credentials,
            token_url: format!("{}{}", base_url.trim_end_matches('/'), TOKEN_PATH),
            http,
            state: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Return the cached token, refreshing it when absent or inside the buffer window.
    pub async fn get_token(&self) -> Result<BearerToken, SmsError> {
        let mut state = self.state.lock().await;
        let now = OffsetDateTime::now_utc();

        if let Some(token) = state
            .as_ref()
            .filter(|token| token.is_fresh(now, REFRESH_BUFFER))
        {
            debug!(expires_in = token.expires_in(now), "using cached token");
            return Ok(token.clone());
        }

        let token = self.request_token().await?;
        *state = Some(token.clone());
        Ok(token)
    }

    /// Refresh regardless of the cached token's remaining lifetime.
    pub async fn force_refresh(&self) -> Result<BearerToken, SmsError> {
        let mut state = self.state.lock().await;
        let token = self.request_token().await?;
        *state = Some(token.clone());
        Ok(token)
    }

    /// Remaining lifetime of the held token in whole seconds, `None` before the first refresh.
    pub async fn expires_in(&self) -> Option<i64> {
        let state = self.state.lock().await;
        state
            .as_ref()
            .map(|token| token.expires_in(OffsetDateTime::now_utc()))
    }

    async fn request_token(&self) -> Result<BearerToken, SmsError> {
        info!(
            username = %self.credentials.username,
            password_set = self.credentials.has_password(),
            url = %self.token_url,
            "requesting new access token"
        );

        let res = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, self.credentials.basic_authorization())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "token request failed");
                SmsError::Auth(format!("token request failed: {}", e))
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| SmsError::Auth(format!("token response unreadable: {}", e)))?;

        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), "token endpoint rejected credentials");
            return Err(SmsError::Auth(format!("token endpoint returned HTTP {}", status)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "token response is not valid JSON");
            SmsError::Auth(format!("malformed token response: {}", e))
        })?;

        let Some(access_token) = parsed.access_token else {
            warn!("token response has no access_token");
            return Err(SmsError::Auth("no access_token in response".into()));
        };

        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN as f64);
        let expires_at = lifetime(expires_in)
            .and_then(|lifetime| OffsetDateTime::now_utc().checked_add(lifetime))
            .ok_or_else(|| {
                warn!(expires_in, "token lifetime out of range");
                SmsError::Auth("expires_in out of range".into())
            })?;
        info!(expires_in, "access token obtained");

        Ok(BearerToken::new(access_token, expires_at))
    }
}

fn lifetime(expires_in: f64) -> Option<Duration> {
    (expires_in.is_finite() && expires_in.abs() <= MAX_EXPIRES_IN as f64)
        .then(|| Duration::seconds_f64(expires_in))
}

#[async_trait]
impl TokenProvider for TokenCache {
    async fn token(&self) -> Result<BearerToken, SmsError> {
        self.get_token().await
    }

    async fn force_refresh(&self) -> Result<BearerToken, SmsError> {
        TokenCache::force_refresh(self).await
    }
}
