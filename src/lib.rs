//! # SMS Middleware
//!
//! HTTP middleware that relays SMS sends to the 1NCE management API.
//!
//! ## Features
//!
//! - **Token caching**: OAuth2 client-credentials token held in memory and refreshed
//!   five minutes before it expires
//! - **SMS relay**: `GET|POST /sms?to=..&message=..` forwarded to the SIM SMS endpoint
//! - **Diagnostics**: `/health` and `/test` report configuration presence, never secrets
//! - **Configuration**: defaults, config files and environment variables
//! - **Observability**: structured logging through `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sms_middleware::{AppConfig, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let app = build_router(&config)?;
//!     let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod telemetry;

pub use crate::config::*;

use std::sync::Arc;

use sms_1nce::OnceClient;
use sms_core::SmsError;
use sms_web_axum::AppState;
use sms_web_generic::{GatewayProcessor, ServiceInfo};

/// Wire the 1NCE client, the processor and the axum routes from configuration.
pub fn build_router(config: &AppConfig) -> Result<axum::Router, SmsError> {
    let client = Arc::new(OnceClient::from_options(config.once.options())?);
    let tokens = client.tokens();
    let info = ServiceInfo {
        username: config.once.username.clone(),
        password_set: config.once.password_set(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let processor = GatewayProcessor::new(client, tokens, info);

    Ok(sms_web_axum::router(AppState { processor }))
}

/// Common imports for SMS Middleware usage
pub mod prelude {
    pub use crate::build_router;
    pub use crate::config::{AppConfig, LoggingConfig, OnceApiConfig, ServerConfig};
    pub use sms_1nce::{Credentials, OnceClient, OnceOptions, TokenCache};
    pub use sms_core::*;
    pub use sms_web_generic::{GatewayProcessor, ServiceInfo, SmsParams};
}
