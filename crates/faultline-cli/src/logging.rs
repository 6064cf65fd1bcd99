//! Structured logging setup

use crate::config::CliConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter from `RUST_LOG`, else from the verbosity level
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()))
}

/// Install the global subscriber; logs go to stderr as text or JSON lines
pub fn init_logging(config: &CliConfig) {
    let (json, text) = if config.log_json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.color.should_color()),
            ),
        )
    };

    // A second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json)
        .with(text)
        .try_init();
}
