//! # 1NCE SMS backend
//!
//! Sends SMS to a SIM through the 1NCE management API. Requests are
//! authenticated with a bearer token obtained by the OAuth2
//! client-credentials grant and cached in a [`TokenCache`].
//!
//! ```rust,ignore
//! use sms_core::{SendRequest, SmsClient};
//! use sms_1nce::{Credentials, OnceClient};
//!
//! let client = OnceClient::new(Credentials::new("user@example.com", "secret"));
//! let res = client.send(SendRequest { to: "+4912345", text: "hi" }).await?;
//! ```

pub mod token;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sms_core::{BearerToken, SendRequest, SendResponse, SmsClient, SmsError, TokenProvider};
use tracing::{debug, info, warn};

pub use token::{Credentials, DEFAULT_EXPIRES_IN, REFRESH_BUFFER, TokenCache};

const PROVIDER: &str = "1nce";

pub const DEFAULT_BASE_URL: &str = "https://api.1nce.com";
/// SIM the middleware is deployed for.
pub const DEFAULT_ICCID: &str = "8988228066614198736";
/// Upstream statuses that mean the SMS was accepted.
pub const ACCEPTED_STATUSES: [u16; 3] = [200, 201, 202];

/// Construction parameters for [`OnceClient`].
#[derive(Clone, Debug)]
pub struct OnceOptions {
    pub credentials: Credentials,
    /// API origin; override for testing/mocking.
    pub base_url: String,
    pub iccid: String,
    pub source_address: String,
    /// Per-request timeout for both token and SMS calls. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl OnceOptions {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            iccid: DEFAULT_ICCID.to_string(),
            source_address: String::new(),
            request_timeout: None,
        }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// 1NCE REST client.
#[derive(Clone, Debug)]
pub struct OnceClient {
    tokens: Arc<TokenCache>,
    sms_url: String,
    source_address: String,
    http: reqwest::Client,
}

impl OnceClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(credentials: Credentials, base_url: String) -> Self {
        let options = OnceOptions::new(credentials).with_base_url(base_url);
        Self::with_http(options, reqwest::Client::new())
    }

    /// Build a client whose HTTP stack honours `options.request_timeout`.
    pub fn from_options(options: OnceOptions) -> Result<Self, SmsError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| SmsError::Transport(format!("http client: {}", e)))?;
        Ok(Self::with_http(options, http))
    }

    fn with_http(options: OnceOptions, http: reqwest::Client) -> Self {
        let base_url = options.base_url.trim_end_matches('/').to_string();
        let sms_url = format!("{}/management-api/v1/sims/{}/sms", base_url, options.iccid);
        let tokens = Arc::new(TokenCache::new(
            options.credentials,
            &base_url,
            http.clone(),
        ));
        Self {
            tokens,
            sms_url,
            source_address: options.source_address,
            http,
        }
    }

    /// Shared handle to the token cache used for upstream calls.
    pub fn tokens(&self) -> Arc<TokenCache> {
        Arc::clone(&self.tokens)
    }

    pub fn sms_url(&self) -> &str {
        &self.sms_url
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OnceSendRequest<'a> {
    source_address: &'a str,
    payload: &'a str,
    submit_sm: SubmitSm,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitSm {
    dest_addr_npi: u8,
    dest_addr_ton: u8,
}

impl SubmitSm {
    /// International number, ISDN/E.164 numbering plan.
    const INTERNATIONAL: SubmitSm = SubmitSm {
        dest_addr_npi: 1,
        dest_addr_ton: 1,
    };
}

#[async_trait]
impl SmsClient for OnceClient {
    async fn send(&self, req: SendRequest<'_>) -> Result<SendResponse, SmsError> {
        let to = req.to.trim();
        if to.is_empty() || req.text.is_empty() {
            return Err(SmsError::Invalid("missing phone number or message".into()));
        }

        let token = self.tokens.get_token().await?;
        let payload = OnceSendRequest {
            source_address: &self.source_address,
            payload: req.text,
            submit_sm: SubmitSm::INTERNATIONAL,
        };

        debug!(url = %self.sms_url, to, "forwarding sms");
        let res = self
            .http
            .post(&self.sms_url)
            .bearer_auth(token.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "sms request failed");
                SmsError::Transport(e.to_string())
            })?;

        let status = res.status().as_u16();
        let raw_text = res
            .text()
            .await
            .map_err(|e| SmsError::Transport(e.to_string()))?;

        if !ACCEPTED_STATUSES.contains(&status) {
            warn!(status, body = %raw_text, "1nce rejected sms");
            return Err(SmsError::Upstream {
                status,
                body: raw_text,
            });
        }

        let raw_json: serde_json::Value = serde_json::from_str(&raw_text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": raw_text }));
        let id = raw_json
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(sms_core::fallback_id);

        info!(status, id = %id, to, "sms accepted");
        Ok(SendResponse {
            id,
            provider: PROVIDER,
            to: to.to_string(),
            text: req.text.to_string(),
            status,
            raw: raw_json,
        })
    }
}

#[async_trait]
impl TokenProvider for OnceClient {
    async fn token(&self) -> Result<BearerToken, SmsError> {
        self.tokens.get_token().await
    }

    async fn force_refresh(&self) -> Result<BearerToken, SmsError> {
        self.tokens.force_refresh().await
    }
}
