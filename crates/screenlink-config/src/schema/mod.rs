//! Configuration schema types for the relay.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod liveness;
mod logging;
mod relay;
mod server;

pub use liveness::*;
pub use logging::*;
pub use relay::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenlinkConfig {
    pub server: ServerConfig,
    pub liveness: LivenessConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ScreenlinkConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.liveness.heartbeat_interval_secs, 30);
        assert_eq!(config.relay.outbound_buffer, 256);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(server.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ScreenlinkConfig = toml::from_str("[server]\nport = 7000\n").unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.handshake_timeout_secs, 10);
        assert_eq!(config.liveness.heartbeat_interval_secs, 30);
    }
}
