//! Per-session state: one optional agent, any number of viewers.

use std::collections::HashMap;
use std::time::Instant;

use screenlink_common::PeerId;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::tungstenite::Message;

use crate::protocol::{AgentScreen, Notice, ViewerScreen};

/// Role of an attached connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Agent,
    Viewer,
}

/// Session-side handle to a connection: its id plus its outbound queue.
///
/// The peer is OPEN for as long as its connection task holds the receiver.
#[derive(Debug, Clone)]
pub struct Peer {
    id: PeerId,
    tx: mpsc::Sender<Message>,
}

impl Peer {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self {
            id: PeerId::new(),
            tx,
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a message without waiting. Returns false if it was dropped.
    pub fn send(&self, msg: Message) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(peer = %self.id, "Outbound queue full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn send_text(&self, text: impl Into<String>) -> bool {
        let text: String = text.into();
        self.send(Message::Text(text.into()))
    }

    pub fn notify(&self, notice: &Notice) -> bool {
        match notice.encode() {
            Ok(json) => self.send_text(json),
            Err(e) => {
                tracing::warn!(peer = %self.id, error = %e, "Failed to encode notice");
                false
            }
        }
    }
}

/// A viewer attached to a session.
#[derive(Debug, Clone)]
pub struct ViewerSlot {
    pub peer: Peer,
    /// Last `client_info` geometry, replaced wholesale on every report.
    pub screen: Option<ViewerScreen>,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    agent: Option<Peer>,
    viewers: HashMap<PeerId, ViewerSlot>,
    agent_screen: Option<AgentScreen>,
    created_at: Instant,
    last_activity: Instant,
    evicted: bool,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            agent: None,
            viewers: HashMap::new(),
            agent_screen: None,
            created_at: now,
            last_activity: now,
            evicted: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// True once the registry has dropped this session. Nothing may attach to
    /// an evicted session.
    pub fn is_evicted(&self) -> bool {
        self.evicted
    }

    pub(crate) fn mark_evicted(&mut self) {
        self.evicted = true;
    }

    /// No agent and no viewers.
    pub fn is_empty(&self) -> bool {
        self.agent.is_none() && self.viewers.is_empty()
    }

    pub fn agent(&self) -> Option<&Peer> {
        self.agent.as_ref()
    }

    pub fn agent_connected(&self) -> bool {
        self.agent.as_ref().is_some_and(Peer::is_open)
    }

    pub fn agent_screen(&self) -> Option<&AgentScreen> {
        self.agent_screen.as_ref()
    }

    pub fn set_agent_screen(&mut self, screen: AgentScreen) {
        self.agent_screen = Some(screen);
    }

    /// Install `peer` as the agent, replacing a slot whose peer is no longer open.
    /// Returns the peer back if an OPEN agent already holds the slot.
    ///
    /// A replaced agent's screen geometry goes with it. Its own late detach
    /// no longer matches the slot, so it announces nothing.
    pub fn install_agent(&mut self, peer: Peer) -> Result<(), Peer> {
        if self.agent_connected() {
            return Err(peer);
        }
        if let Some(stale) = self.agent.replace(peer) {
            tracing::debug!(session = %self.id, peer = %stale.id(), "Replacing closed agent");
            self.agent_screen = None;
        }
        Ok(())
    }

    /// Clear the agent slot if `id` still holds it. Also forgets the agent's
    /// screen geometry.
    pub fn remove_agent(&mut self, id: &PeerId) -> bool {
        if self.agent.as_ref().is_some_and(|agent| agent.id() == id) {
            self.agent = None;
            self.agent_screen = None;
            return true;
        }
        false
    }

    pub fn add_viewer(&mut self, peer: Peer) {
        self.viewers
            .insert(peer.id().clone(), ViewerSlot { peer, screen: None });
    }

    pub fn remove_viewer(&mut self, id: &PeerId) -> bool {
        self.viewers.remove(id).is_some()
    }

    pub fn viewer(&self, id: &PeerId) -> Option<&ViewerSlot> {
        self.viewers.get(id)
    }

    pub fn viewer_mut(&mut self, id: &PeerId) -> Option<&mut ViewerSlot> {
        self.viewers.get_mut(id)
    }

    pub fn viewers(&self) -> impl Iterator<Item = &ViewerSlot> {
        self.viewers.values()
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Best-effort fan-out to every OPEN viewer. Returns how many accepted it.
    pub fn broadcast(&self, msg: &Message) -> usize {
        self.viewers
            .values()
            .filter(|slot| slot.peer.is_open())
            .filter(|slot| slot.peer.send(msg.clone()))
            .count()
    }

    pub fn broadcast_notice(&self, notice: &Notice) -> usize {
        match notice.encode() {
            Ok(json) => self.broadcast(&Message::Text(json.into())),
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Failed to encode notice");
                0
            }
        }
    }
}
