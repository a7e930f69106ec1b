use serde::{Deserialize, Serialize};

/// Message routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Per-connection outbound queue depth. Messages beyond this are dropped
    /// for that recipient only.
    pub outbound_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: 256,
        }
    }
}
