//! Connection classification and session attachment.

use screenlink_common::RelayError;
use url::form_urlencoded;

use crate::protocol::Notice;
use crate::registry::SessionRegistry;
use crate::relay::RelayChannel;
use crate::session::{Peer, Role};

pub const AGENT_PATH: &str = "/agent";
pub const VIEWER_PATH: &str = "/viewer";
const SESSION_ID_PARAM: &str = "sessionId";

/// Result of classifying an upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub session_id: String,
    pub role: Role,
}

/// Classify a request by path and `sessionId` query parameter.
///
/// An unknown path wins over a missing session id. An empty `sessionId`
/// counts as missing.
pub fn classify(path: &str, query: Option<&str>) -> Result<Admission, RelayError> {
    let role = match path {
        AGENT_PATH => Role::Agent,
        VIEWER_PATH => Role::Viewer,
        other => return Err(RelayError::UnknownPath(other.to_string())),
    };

    let session_id = query
        .and_then(|q| {
            form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == SESSION_ID_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|id| !id.is_empty())
        .ok_or(RelayError::MissingSessionId)?;

    Ok(Admission { session_id, role })
}

/// Attaches classified connections to sessions.
#[derive(Clone, Default)]
pub struct ConnectionRouter {
    registry: SessionRegistry,
}

impl ConnectionRouter {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Attach `peer` to its session under the admitted role.
    ///
    /// A viewer is immediately told whether the agent is connected. An agent
    /// is refused if the session already has an OPEN agent; otherwise every
    /// viewer is told the agent is now connected.
    pub async fn attach(
        &self,
        admission: Admission,
        peer: Peer,
    ) -> Result<RelayChannel, RelayError> {
        let Admission { session_id, role } = admission;
        let peer_id = peer.id().clone();

        loop {
            let handle = self.registry.get_or_create(&session_id).await;
            let mut session = handle.lock().await;
            if session.is_evicted() {
                // Lost a race with the last member leaving; fetch the new session.
                continue;
            }

            match role {
                Role::Agent => {
                    if session.install_agent(peer).is_err() {
                        return Err(RelayError::DuplicateAgent(session_id));
                    }
                    let notified =
                        session.broadcast_notice(&Notice::AgentStatus { connected: true });
                    tracing::info!(
                        session = %session_id,
                        peer = %peer_id,
                        viewers_notified = notified,
                        "Agent attached"
                    );
                }
                Role::Viewer => {
                    let connected = session.agent_connected();
                    peer.notify(&Notice::AgentStatus { connected });
                    session.add_viewer(peer);
                    tracing::info!(
                        session = %session_id,
                        peer = %peer_id,
                        agent_connected = connected,
                        viewers = session.viewer_count(),
                        "Viewer attached"
                    );
                }
            }

            drop(session);
            return Ok(RelayChannel::new(handle, session_id, role, peer_id));
        }
    }
}
