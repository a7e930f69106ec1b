//! Environment overrides.

use crate::schema::ScreenlinkConfig;
use screenlink_common::ConfigError;
use tracing::info;

/// Environment variable carrying the listen port.
pub const PORT_ENV: &str = "PORT";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut ScreenlinkConfig) -> Result<(), ConfigError> {
    apply_port_override(config, std::env::var(PORT_ENV).ok().as_deref())
}

/// Override `server.port` from a raw `PORT` value. Blank values are ignored.
pub fn apply_port_override(
    config: &mut ScreenlinkConfig,
    raw: Option<&str>,
) -> Result<(), ConfigError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(());
    };

    let port = raw
        .parse::<u16>()
        .map_err(|e| ConfigError::ParseError(format!("{PORT_ENV}={raw:?} is not a valid port: {e}")))?;

    info!(port, "using port from {PORT_ENV}");
    config.server.port = port;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_port_keeps_config_value() {
        let mut config = ScreenlinkConfig::default();
        apply_port_override(&mut config, None).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn blank_port_is_ignored() {
        let mut config = ScreenlinkConfig::default();
        apply_port_override(&mut config, Some("  ")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn numeric_port_overrides() {
        let mut config = ScreenlinkConfig::default();
        apply_port_override(&mut config, Some("3000")).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn invalid_port_is_a_parse_error() {
        let mut config = ScreenlinkConfig::default();
        let err = apply_port_override(&mut config, Some("eighty")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().contains("PORT"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn out_of_range_port_is_a_parse_error() {
        let mut config = ScreenlinkConfig::default();
        assert!(apply_port_override(&mut config, Some("70000")).is_err());
    }
}
