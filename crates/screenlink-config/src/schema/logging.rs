use serde::{Deserialize, Serialize};

/// Filter used until a config is loaded, and the config's own default.
pub const DEFAULT_LOG_FILTER: &str = "screenlink_relay=info,screenlink_config=info";

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}
