//! TCP accept loop and graceful shutdown.


use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use screenlink_config::ScreenlinkConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::connection::{handle_connection, ConnectionSettings};
use crate::registry::SessionRegistry;
use crate::router::ConnectionRouter;

/// How long shutdown waits for connections to detach.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct RelayServer {
    listener: TcpListener,
    router: ConnectionRouter,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
}

impl RelayServer {
    /// Bind the listener described by `config`.
    pub async fn bind(config: &ScreenlinkConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.server.bind_addr()).await?;
        Ok(Self::from_listener(listener, ConnectionSettings::from(config)))
    }

    pub fn from_listener(listener: TcpListener, settings: ConnectionSettings) -> Self {
        Self {
            listener,
            router: ConnectionRouter::new(SessionRegistry::new()),
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn router(&self) -> &ConnectionRouter {
        &self.router
    }

    /// Token that stops the accept loop and closes every connection.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Accept connections until the shutdown token fires, then wait for the
    /// open connections to close.
    pub async fn run(self) {
        let Self {
            listener,
            router,
            settings,
            shutdown,
        } = self;
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        tracing::debug!(peer = %addr, "TCP connection accepted");
                        tracker.spawn(handle_connection(
                            stream,
                            addr,
                            router.clone(),
                            settings.clone(),
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "TCP accept error");
                    }
                },
            }
        }

        drop(listener);
        tracker.close();
        tracing::info!(connections = tracker.len(), "Shutting down");
        if tokio::time::timeout(SHUTDOWN_GRACE, tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                connections = tracker.len(),
                "Connections still open after shutdown grace period"
            );
        }
        let sessions = router.registry().snapshot().await;
        for session in &sessions {
            tracing::debug!(
                session = %session.id,
                agent_connected = session.agent_connected,
                viewers = session.viewers,
                "Session still open at shutdown"
            );
        }
        tracing::info!(sessions = sessions.len(), "Server stopped");
    }
}
