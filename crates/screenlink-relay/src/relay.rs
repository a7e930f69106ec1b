//! Per-session message routing.
//!
//! Agent messages fan out to every viewer, annotated with the agent's native
//! resolution. Viewer messages go to the agent, except `client_info`, which
//! the relay answers itself with a `set_scale` hint.

use screenlink_common::PeerId;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::protocol::{AgentScreen, Envelope, MessageKind, Notice, ViewerScreen};
use crate::registry::{SessionHandle, SessionRegistry};
use crate::scale::compute_scale;
use crate::session::{Role, Session};

/// A connection's attachment to its session.
#[derive(Debug)]
pub struct RelayChannel {
    session: SessionHandle,
    session_id: String,
    role: Role,
    peer_id: PeerId,
}

impl RelayChannel {
    pub(crate) fn new(session: SessionHandle, session_id: String, role: Role, peer_id: PeerId) -> Self {
        Self {
            session,
            session_id,
            role,
            peer_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Route one inbound text message. Malformed input is logged and dropped.
    pub async fn dispatch(&self, text: &str) {
        let decoded = Envelope::decode(text);

        let mut session = self.session.lock().await;
        session.touch();

        let envelope = match decoded {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    session = %self.session_id,
                    role = ?self.role,
                    error = %e,
                    "Dropping malformed message"
                );
                return;
            }
        };

        match self.role {
            Role::Agent => {
                relay_from_agent(&mut session, envelope);
            }
            Role::Viewer => {
                relay_from_viewer(&mut session, &self.peer_id, envelope, text);
            }
        }
    }

    /// Remove this connection from its session and evict the session if it
    /// is now empty.
    pub async fn detach(self, registry: &SessionRegistry) {
        {
            let mut session = self.session.lock().await;
            match self.role {
                Role::Agent => {
                    if session.remove_agent(&self.peer_id) {
                        let notified =
                            session.broadcast_notice(&Notice::AgentStatus { connected: false });
                        info!(
                            session = %self.session_id,
                            peer = %self.peer_id,
                            viewers_notified = notified,
                            "Agent detached"
                        );
                    }
                }
                Role::Viewer => {
                    session.remove_viewer(&self.peer_id);
                    info!(
                        session = %self.session_id,
                        peer = %self.peer_id,
                        viewers = session.viewer_count(),
                        "Viewer detached"
                    );
                }
            }
        }

        registry.evict_if_empty(&self.session_id).await;
    }
}

fn scale_notice(agent: &AgentScreen, viewer: &ViewerScreen) -> Notice {
    Notice::SetScale {
        scale: compute_scale(agent, viewer),
        original_width: agent.width,
        original_height: agent.height,
    }
}

/// Apply an agent message to the session and broadcast it to all viewers.
/// Returns the number of viewers that accepted the broadcast.
pub fn relay_from_agent(session: &mut Session, mut envelope: Envelope) -> usize {
    if let MessageKind::ScreenInfo(screen) = envelope.kind {
        session.set_agent_screen(screen);
        for slot in session.viewers() {
            if let Some(viewer_screen) = &slot.screen {
                slot.peer.notify(&scale_notice(&screen, viewer_screen));
            }
        }
        debug!(
            session = %session.id(),
            width = screen.width,
            height = screen.height,
            "Agent screen updated"
        );
    }

    if let Some(screen) = session.agent_screen().copied() {
        envelope.annotate(&screen);
    }

    match envelope.encode() {
        Ok(json) => session.broadcast(&Message::Text(json.into())),
        Err(e) => {
            warn!(session = %session.id(), error = %e, "Failed to encode agent message");
            0
        }
    }
}

/// Apply a viewer message: store `client_info` geometry, forward anything
/// else verbatim to the agent. Returns true if something was sent.
pub fn relay_from_viewer(
    session: &mut Session,
    viewer_id: &PeerId,
    envelope: Envelope,
    text: &str,
) -> bool {
    if let MessageKind::ClientInfo(screen) = envelope.kind {
        let agent_screen = session.agent_screen().copied();
        let Some(slot) = session.viewer_mut(viewer_id) else {
            return false;
        };
        slot.screen = Some(screen);
        return match agent_screen {
            Some(agent_screen) => slot.peer.notify(&scale_notice(&agent_screen, &screen)),
            None => false,
        };
    }

    match session.agent().filter(|agent| agent.is_open()) {
        Some(agent) => agent.send_text(text),
        None => {
            warn!(
                session = %session.id(),
                viewer = %viewer_id,
                kind = envelope.kind.name(),
                "No agent connected, dropping viewer message"
            );
            false
        }
    }
}
