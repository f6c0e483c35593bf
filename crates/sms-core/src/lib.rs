//! # SMS Core
//!
//! Core traits and types shared by the SMS middleware crates.
//!
//! This crate provides the provider-neutral building blocks:
//! - [`SmsClient`] trait for sending SMS messages
//! - [`TokenProvider`] trait for bearer-token sources
//! - [`SmsError`] taxonomy and the framework-agnostic [`GatewayResponse`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{SendRequest, SmsClient};
//!
//! // Any SMS backend implements SmsClient
//! let response = client.send(SendRequest {
//!     to: "+1234567890",
//!     text: "Hello world!"
//! }).await?;
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Errors that can occur during SMS operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmsError {
    /// No usable bearer token: bad credentials, network error or malformed token response
    #[error("authentication error: {0}")]
    Auth(String),
    /// Missing or malformed caller input
    #[error("invalid request: {0}")]
    Invalid(String),
    /// Provider answered with a status outside the accepted set
    #[error("upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
    /// Network-level failure talking to the provider
    #[error("transport error: {0}")]
    Transport(String),
}

impl SmsError {
    /// HTTP status a gateway should answer with for this error.
    pub fn http_status(&self) -> HttpStatus {
        match self {
            SmsError::Auth(_) => HttpStatus::UNAUTHORIZED,
            SmsError::Invalid(_) => HttpStatus::BAD_REQUEST,
            SmsError::Upstream { status, .. } => HttpStatus::from_u16(*status)
                .unwrap_or(HttpStatus::INTERNAL_SERVER_ERROR),
            SmsError::Transport(_) => HttpStatus::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatus(u16);

impl HttpStatus {
    pub const OK: HttpStatus = HttpStatus(200);
    pub const BAD_REQUEST: HttpStatus = HttpStatus(400);
    pub const UNAUTHORIZED: HttpStatus = HttpStatus(401);
    pub const NOT_FOUND: HttpStatus = HttpStatus(404);
    pub const INTERNAL_SERVER_ERROR: HttpStatus = HttpStatus(500);

    /// Accepts any code in the valid `100..=999` range.
    pub fn from_u16(code: u16) -> Option<Self> {
        (100..=999).contains(&code).then_some(HttpStatus(code))
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest<'a> {
    pub to: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResponse {
    pub id: String,
    /// Name of the backend/provider that produced the response, e.g. "1nce".
    pub provider: &'static str,
    /// Normalized recipient as accepted by the backend.
    pub to: String,
    pub text: String,
    /// Upstream HTTP status that signalled acceptance.
    pub status: u16,
    /// Raw provider payload for debugging / audit.
    pub raw: serde_json::Value,
}

/// Short-lived bearer credential together with its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    secret: String,
    expires_at: OffsetDateTime,
}

impl BearerToken {
    pub fn new(secret: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Returns the raw token. Callers must keep it out of logs and response bodies.
    pub fn expose(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// Whole seconds until expiry; negative once expired.
    pub fn expires_in(&self, now: OffsetDateTime) -> i64 {
        (self.expires_at - now).whole_seconds()
    }

    /// True while `now` is earlier than `expires_at - buffer`.
    pub fn is_fresh(&self, now: OffsetDateTime, buffer: Duration) -> bool {
        self.expires_at
            .checked_sub(buffer)
            .is_some_and(|limit| now < limit)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Generic gateway response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl GatewayResponse {
    pub fn json(status: HttpStatus, value: &serde_json::Value) -> Self {
        Self {
            status,
            body: serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()),
            content_type: "application/json".to_string(),
        }
    }

    pub fn ok(value: &serde_json::Value) -> Self {
        Self::json(HttpStatus::OK, value)
    }

    pub fn error(status: HttpStatus, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// Error body that also carries diagnostic details, e.g. a raw upstream body.
    pub fn error_with_details(status: HttpStatus, message: &str, details: &str) -> Self {
        Self::json(
            status,
            &serde_json::json!({ "error": message, "details": details }),
        )
    }
}

#[async_trait]
pub trait SmsClient: Send + Sync {
    /// Send a single text SMS.
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError>;
}

/// Source of bearer tokens for upstream calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a usable token, refreshing it first when necessary.
    async fn token(&self) -> Result<BearerToken, SmsError>;

    /// Refresh unconditionally and return the new token.
    async fn force_refresh(&self) -> Result<BearerToken, SmsError>;
}

/// Utility to create a pseudo id if a provider doesn't return one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

/// Seconds since the unix epoch with sub-second precision.
pub fn unix_timestamp(now: OffsetDateTime) -> f64 {
    now.unix_timestamp_nanos() as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_formatters_redact() {
        let token = BearerToken::new("super-secret", OffsetDateTime::UNIX_EPOCH);

        assert!(!format!("{token:?}").contains("super-secret"));
        assert_eq!(format!("{token}"), "<redacted>");
        assert_eq!(token.expose(), "super-secret");
    }

    #[test]
    fn freshness_respects_buffer() {
        let now = OffsetDateTime::now_utc();
        let token = BearerToken::new("t", now + Duration::seconds(600));

        assert!(token.is_fresh(now, Duration::seconds(300)));
        assert!(!token.is_fresh(now + Duration::seconds(300), Duration::seconds(300)));
        assert_eq!(token.expires_in(now), 600);
    }

    #[test]
    fn freshness_near_the_minimum_date_is_stale() {
        let token = BearerToken::new("t", time::PrimitiveDateTime::MIN.assume_utc());

        assert!(!token.is_fresh(OffsetDateTime::now_utc(), Duration::seconds(300)));
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(SmsError::Auth("x".into()).http_status().as_u16(), 401);
        assert_eq!(SmsError::Invalid("x".into()).http_status().as_u16(), 400);
        assert_eq!(SmsError::Transport("x".into()).http_status().as_u16(), 500);

        let upstream = SmsError::Upstream {
            status: 503,
            body: "down".into(),
        };
        assert_eq!(upstream.http_status().as_u16(), 503);

        let bogus = SmsError::Upstream {
            status: 42,
            body: String::new(),
        };
        assert_eq!(bogus.http_status(), HttpStatus::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_escapes_quotes() {
        let response = GatewayResponse::error(HttpStatus::BAD_REQUEST, r#"bad "to""#);
        let parsed: serde_json::Value = serde_json::from_str(&response.body).unwrap();

        assert_eq!(parsed["error"], r#"bad "to""#);
        assert_eq!(response.content_type, "application/json");
    }
}
