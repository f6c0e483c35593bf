use std::borrow::Cow;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::json;
use sms_core::{
    GatewayResponse, HttpStatus, SendRequest, SendResponse, SmsClient, SmsError, TokenProvider,
    unix_timestamp,
};
use time::OffsetDateTime;
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "1NCE SMS Middleware";

/// Query parameters of the send route, already percent-decoded once by the framework.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmsParams {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub message: String,
}

/// Non-secret facts about the deployment that the info routes echo back.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub username: String,
    pub password_set: bool,
    pub version: String,
}

/// Framework-agnostic processor that implements the middleware routes
#[derive(Clone)]
pub struct GatewayProcessor {
    client: Arc<dyn SmsClient>,
    tokens: Arc<dyn TokenProvider>,
    info: ServiceInfo,
}

impl GatewayProcessor {
    pub fn new(
        client: Arc<dyn SmsClient>,
        tokens: Arc<dyn TokenProvider>,
        info: ServiceInfo,
    ) -> Self {
        Self {
            client,
            tokens,
            info,
        }
    }

    /// `GET /`: banner and endpoint list.
    pub fn home(&self) -> GatewayResponse {
        GatewayResponse::ok(&json!({
            "service": format!("{} v{}", SERVICE_NAME, self.info.version),
            "status": "online",
            "endpoints": {
                "health": "/health - Check authentication status",
                "sms": "/sms?to=PHONE&message=MESSAGE - Send SMS",
                "test": "/test - Verify deployment",
            },
            "timestamp": unix_timestamp(OffsetDateTime::now_utc()),
        }))
    }

    /// `GET /health`: obtains a token (refreshing if needed) and reports its state.
    pub async fn health(&self) -> GatewayResponse {
        let token = self.tokens.token().await;
        let now = OffsetDateTime::now_utc();

        let mut body = json!({
            "service": SERVICE_NAME,
            "status": "healthy",
            "token_valid": token.is_ok(),
            "username": self.info.username,
            "password_set": self.info.password_set,
            "timestamp": unix_timestamp(now),
        });
        if let Ok(token) = &token {
            body["token_expires_in"] = json!(token.expires_in(now));
        }

        info!(token_valid = token.is_ok(), "health check");
        GatewayResponse::ok(&body)
    }

    /// `GET|POST /sms`: validate, forward and translate the outcome.
    pub async fn send_sms(&self, params: &SmsParams) -> GatewayResponse {
        info!(to = %params.to, "sms request received");
        match self.send_sms_internal(params).await {
            Ok(sent) => GatewayResponse::ok(&json!({
                "status": "success",
                "message": "SMS sent successfully",
                "to": sent.to,
                "text": sent.text,
            })),
            Err(e) => self.error_to_response(e),
        }
    }

    /// `GET /test`: deployment verification.
    pub fn deployment_test(&self) -> GatewayResponse {
        GatewayResponse::ok(&json!({
            "test": "DEPLOYMENT SUCCESSFUL",
            "username": self.info.username,
            "password_configured": self.info.password_set,
            "version": self.info.version,
        }))
    }

    async fn send_sms_internal(&self, params: &SmsParams) -> Result<SendResponse, SmsError> {
        let to = unescape(&params.to);
        let message = unescape(&params.message);
        if to.trim().is_empty() || message.is_empty() {
            return Err(SmsError::Invalid("missing phone number or message".into()));
        }

        self.client
            .send(SendRequest {
                to: &to,
                text: &message,
            })
            .await
    }

    fn error_to_response(&self, error: SmsError) -> GatewayResponse {
        warn!(error = %error, "sms request failed");
        let status = error.http_status();
        match error {
            SmsError::Invalid(_) => {
                GatewayResponse::error(status, "Missing phone number or message")
            }
            SmsError::Auth(_) => GatewayResponse::error(status, "Authentication failed"),
            SmsError::Upstream { status: code, body } => GatewayResponse::error_with_details(
                status,
                &format!("1NCE SMS API error: {}", code),
                &body,
            ),
            SmsError::Transport(_) => {
                GatewayResponse::error(HttpStatus::INTERNAL_SERVER_ERROR, "SMS sending failed")
            }
        }
    }
}

/// Second percent-decoding pass for clients that encode twice. Invalid UTF-8 becomes U+FFFD.
fn unescape(value: &str) -> Cow<'_, str> {
    percent_decode_str(value).decode_utf8_lossy()
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_gateway_response(response: GatewayResponse) -> Self::ResponseType;
}
