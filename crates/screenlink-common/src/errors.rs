use std::path::PathBuf;

/// WebSocket close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// WebSocket close code for a policy violation.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures raised while classifying a connection or routing its messages.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("unknown connection path: {0}")]
    UnknownPath(String),

    #[error("missing sessionId query parameter")]
    MissingSessionId,

    #[error("session {0} already has a connected agent")]
    DuplicateAgent(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("websocket handshake failed: {0}")]
    Handshake(String),
}

impl RelayError {
    /// Close code sent to the peer when this error ends a connection.
    ///
    /// `None` means the error never closes the connection on its own.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::UnknownPath(_) => Some(CLOSE_NORMAL),
            Self::MissingSessionId | Self::DuplicateAgent(_) => Some(CLOSE_POLICY_VIOLATION),
            Self::MalformedMessage(_) | Self::Handshake(_) => None,
        }
    }

    /// Human-readable close reason sent alongside the close code.
    pub fn close_reason(&self) -> &'static str {
        match self {
            Self::UnknownPath(_) => "Unknown connection type",
            Self::MissingSessionId => "sessionId is required",
            Self::DuplicateAgent(_) => "Another agent is already connected.",
            Self::MalformedMessage(_) | Self::Handshake(_) => "",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScreenlinkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("server.port out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: server.port out of range"
        );
    }

    #[test]
    fn relay_error_display() {
        let err = RelayError::UnknownPath("/admin".into());
        assert_eq!(err.to_string(), "unknown connection path: /admin");

        let err = RelayError::DuplicateAgent("abc".into());
        assert_eq!(err.to_string(), "session abc already has a connected agent");

        let err = RelayError::MalformedMessage("expected value at line 1".into());
        assert_eq!(
            err.to_string(),
            "malformed message: expected value at line 1"
        );
    }

    #[test]
    fn protocol_violations_carry_close_codes() {
        assert_eq!(
            RelayError::UnknownPath("/".into()).close_code(),
            Some(CLOSE_NORMAL)
        );
        assert_eq!(
            RelayError::MissingSessionId.close_code(),
            Some(CLOSE_POLICY_VIOLATION)
        );
        assert_eq!(
            RelayError::DuplicateAgent("abc".into()).close_code(),
            Some(CLOSE_POLICY_VIOLATION)
        );
    }

    #[test]
    fn message_errors_never_close() {
        assert_eq!(RelayError::MalformedMessage("x".into()).close_code(), None);
        assert_eq!(RelayError::Handshake("x".into()).close_code(), None);
    }

    #[test]
    fn screenlink_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: ScreenlinkError = config_err.into();
        assert!(matches!(err, ScreenlinkError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn screenlink_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: ScreenlinkError = io_err.into();
        assert!(matches!(err, ScreenlinkError::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }
}
