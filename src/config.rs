use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use sms_1nce::{Credentials, DEFAULT_BASE_URL, DEFAULT_ICCID, OnceOptions};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// 1NCE API configuration
    pub once: OnceApiConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 5000)
    pub port: u16,
}

/// 1NCE management API configuration
#[derive(Deserialize, Serialize, Clone)]
pub struct OnceApiConfig {
    /// OAuth2 client-credentials username
    pub username: String,
    /// OAuth2 client-credentials password
    pub password: String,
    /// API origin (default: https://api.1nce.com)
    pub api_base_url: String,
    /// SIM the SMS endpoint is addressed to
    pub iccid: String,
    /// `sourceAddress` sent with every SMS (default: empty)
    pub source_address: String,
    /// Upstream request timeout in seconds, 0 disables it (default: 30)
    pub request_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for OnceApiConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            iccid: DEFAULT_ICCID.to_string(),
            source_address: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl std::fmt::Debug for OnceApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnceApiConfig")
            .field("username", &self.username)
            .field("password_set", &self.password_set())
            .field("api_base_url", &self.api_base_url)
            .field("iccid", &self.iccid)
            .field("source_address", &self.source_address)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl OnceApiConfig {
    pub fn password_set(&self) -> bool {
        !self.password.is_empty()
    }

    /// Client construction parameters derived from this section.
    pub fn options(&self) -> OnceOptions {
        OnceOptions {
            credentials: Credentials::new(self.username.as_str(), self.password.as_str()),
            base_url: self.api_base_url.clone(),
            iccid: self.iccid.clone(),
            source_address: self.source_address.clone(),
            request_timeout: (self.request_timeout_seconds > 0)
                .then(|| Duration::from_secs(self.request_timeout_seconds)),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        Self::builder(&run_mode)?
            // Flat variables used by existing deployments win over everything else
            .set_override_option("once.username", env::var("ONCEAPI_USERNAME").ok())?
            .set_override_option("once.password", env::var("ONCEAPI_PASSWORD").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()?
            .try_deserialize()
    }

    fn builder(
        run_mode: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with SMSKIT_)
            .add_source(
                Environment::with_prefix("SMSKIT")
                    .separator("__")
                    .try_parsing(true),
            ))
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hosted_service() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.once.api_base_url, "https://api.1nce.com");
        assert_eq!(config.once.iccid, "8988228066614198736");
        assert!(!config.once.password_set());
    }

    #[test]
    fn debug_output_hides_password() {
        let mut config = AppConfig::default();
        config.once.password = "hunter2".into();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("password_set: true"));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let mut once = OnceApiConfig::default();
        assert_eq!(once.options().request_timeout, Some(Duration::from_secs(30)));

        once.request_timeout_seconds = 0;
        assert_eq!(once.options().request_timeout, None);
    }

    #[test]
    fn defaults_survive_a_config_round_trip() {
        let config: AppConfig = AppConfig::builder("test")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.once.source_address, "");
    }
}
