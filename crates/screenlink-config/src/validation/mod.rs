//! Configuration validation.
//!
//! Each section has its own check; this orchestrator calls them all and
//! collects errors into a single `ConfigError`.

mod helpers;


use crate::schema::ScreenlinkConfig;
use helpers::{validate_non_empty, validate_range};
use screenlink_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ScreenlinkConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_liveness(&mut errors, config);
    validate_relay(&mut errors, config);
    validate_non_empty(&mut errors, "logging.filter", &config.logging.filter);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &ScreenlinkConfig) {
    validate_non_empty(errors, "server.host", &config.server.host);
    validate_range(
        errors,
        "server.handshake_timeout_secs",
        config.server.handshake_timeout_secs,
        1,
        120,
    );
}

fn validate_liveness(errors: &mut Vec<String>, config: &ScreenlinkConfig) {
    validate_range(
        errors,
        "liveness.heartbeat_interval_secs",
        config.liveness.heartbeat_interval_secs,
        1,
        3600,
    );
}

fn validate_relay(errors: &mut Vec<String>, config: &ScreenlinkConfig) {
    validate_range(
        errors,
        "relay.outbound_buffer",
        config.relay.outbound_buffer as u64,
        1,
        65536,
    );
}
