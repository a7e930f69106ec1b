//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# screenlink relay configuration
# Only override what you want to change -- missing fields use defaults.
# The PORT environment variable and the --port flag override server.port.

[server]
# host = "0.0.0.0"
# port = 8080                  # 0 picks an ephemeral port
# handshake_timeout_secs = 10  # 1-120

[liveness]
# heartbeat_interval_secs = 30 # 1-3600

[relay]
# outbound_buffer = 256        # 1-65536

[logging]
# filter = "screenlink_relay=info,screenlink_config=info"
"##
    .to_string()
}
