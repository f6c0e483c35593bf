use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` takes precedence over `logging.level`.
pub fn init(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true),
            )
            .init();
    }
}

const WORKSPACE_TARGETS: [&str; 5] = [
    "sms_middleware",
    "sms_core",
    "sms_1nce",
    "sms_web_generic",
    "sms_web_axum",
];

fn default_directives(level: &str) -> String {
    WORKSPACE_TARGETS
        .iter()
        .fold(level.to_string(), |directives, target| {
            format!("{directives},{target}={level}")
        })
}
