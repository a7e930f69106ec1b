//! Per-connection handler: upgrade, classify, attach, then pump messages.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use screenlink_common::RelayError;
use screenlink_config::ScreenlinkConfig;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::liveness::{LivenessMonitor, Tick};
use crate::router::{classify, ConnectionRouter};
use crate::session::Peer;

/// How long a closing peer gets to acknowledge our close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Pings and close frames waiting for the writer.
const CONTROL_BUFFER: usize = 4;

/// Knobs applied to every connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub heartbeat_interval: Duration,
    pub handshake_timeout: Duration,
    pub outbound_buffer: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(10),
            outbound_buffer: 256,
        }
    }
}

impl From<&ScreenlinkConfig> for ConnectionSettings {
    fn from(config: &ScreenlinkConfig) -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(config.liveness.heartbeat_interval_secs),
            handshake_timeout: Duration::from_secs(config.server.handshake_timeout_secs),
            outbound_buffer: config.relay.outbound_buffer,
        }
    }
}

/// Handle a single TCP connection from upgrade to detach.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    router: ConnectionRouter,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) {
    // 1. Upgrade, capturing the request target.
    let (ws, path, query) = match tokio::time::timeout(settings.handshake_timeout, upgrade(stream)).await
    {
        Ok(Ok(upgraded)) => upgraded,
        Ok(Err(e)) => {
            warn!(peer = %addr, error = %e, "WS handshake failed");
            return;
        }
        Err(_) => {
            warn!(peer = %addr, timeout = ?settings.handshake_timeout, "WS handshake timed out");
            return;
        }
    };

    // 2. Classify and attach.
    let admission = match classify(&path, query.as_deref()) {
        Ok(admission) => admission,
        Err(e) => {
            reject(ws, addr, &e).await;
            return;
        }
    };

    let (tx, rx) = mpsc::channel::<Message>(settings.outbound_buffer);
    let channel = match router.attach(admission, Peer::new(tx)).await {
        Ok(channel) => channel,
        Err(e) => {
            reject(ws, addr, &e).await;
            return;
        }
    };

    info!(
        peer = %addr,
        session = %channel.session_id(),
        role = ?channel.role(),
        id = %channel.peer_id(),
        "Client registered"
    );

    // 3. Pump until either side goes away. Socket writes happen on a
    // separate task so a peer that stops reading never stalls the heartbeat.
    let (sink, mut stream) = ws.split();
    let (control_tx, control_rx) = mpsc::channel::<Message>(CONTROL_BUFFER);
    let mut writer = tokio::spawn(write_loop(sink, rx, control_rx));
    let mut writer_done = false;
    let mut liveness = LivenessMonitor::new(settings.heartbeat_interval);
    let mut ticker = liveness.ticker();
    let mut graceful = true;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = control_tx.try_send(close_message(CloseCode::Normal, "server shutting down"));
                break;
            }

            // Writer gave up: the socket is gone.
            _ = &mut writer => {
                writer_done = true;
                break;
            }

            _ = ticker.tick() => match liveness.on_tick() {
                Tick::Ping => {
                    // A full control queue means the writer is stuck; the
                    // next tick terminates.
                    let _ = control_tx.try_send(Message::Ping(Default::default()));
                }
                Tick::Terminate => {
                    warn!(
                        peer = %addr,
                        session = %channel.session_id(),
                        interval = ?liveness.period(),
                        "No pong since last heartbeat, terminating"
                    );
                    graceful = false;
                    break;
                }
            },

            // Messages from this client's WebSocket → relay
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        channel.dispatch(text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => channel.dispatch(text).await,
                        Err(_) => {
                            warn!(
                                peer = %addr,
                                session = %channel.session_id(),
                                bytes = data.len(),
                                "Dropping non-UTF-8 binary message"
                            );
                        }
                    },
                    Some(Ok(Message::Pong(_))) => liveness.record_pong(),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    // tungstenite answers pings itself
                    _ => {}
                }
            }
        }
    }

    // 4. Cleanup. Closing the control queue lets the writer flush and close;
    // a terminated or stuck writer is aborted. Either way the outbound
    // receiver is gone before we detach, so no broadcast queues into it.
    drop(control_tx);
    if !writer_done
        && (!graceful || tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err())
    {
        writer.abort();
        let _ = writer.await;
    }
    drop(stream);

    info!(
        peer = %addr,
        session = %channel.session_id(),
        role = ?channel.role(),
        "Client disconnected"
    );
    channel.detach(router.registry()).await;
}

/// Drain the control and outbound queues into the socket. Control frames
/// (pings, close) go first. Returns once the control queue is closed or a
/// write fails.
async fn write_loop(
    mut sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound: mpsc::Receiver<Message>,
    mut control: mpsc::Receiver<Message>,
) {
    loop {
        let msg = tokio::select! {
            biased;
            msg = control.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
            Some(msg) = outbound.recv() => msg,
        };
        if sink.send(msg).await.is_err() {
            return;
        }
    }

    drop(outbound);
    let _ = tokio::time::timeout(CLOSE_GRACE, sink.close()).await;
}

/// Accept the WebSocket upgrade and return the request path and query.
async fn upgrade(
    stream: TcpStream,
) -> Result<(WebSocketStream<TcpStream>, String, Option<String>), RelayError> {
    let mut target: Option<(String, Option<String>)> = None;
    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        target = Some((
            req.uri().path().to_string(),
            req.uri().query().map(str::to_owned),
        ));
        Ok(resp)
    };

    let ws = accept_hdr_async(stream, callback)
        .await
        .map_err(|e| RelayError::Handshake(e.to_string()))?;
    let (path, query) =
        target.ok_or_else(|| RelayError::Handshake("request target not captured".into()))?;
    Ok((ws, path, query))
}

/// Close a connection that failed classification or attachment.
async fn reject(mut ws: WebSocketStream<TcpStream>, addr: SocketAddr, err: &RelayError) {
    warn!(peer = %addr, error = %err, "Rejecting connection");

    let frame = err.close_code().map(|code| CloseFrame {
        code: CloseCode::from(code),
        reason: err.close_reason().to_string().into(),
    });
    if ws.close(frame).await.is_err() {
        return;
    }

    // Give the client a moment to echo the close before the socket drops.
    let _ = tokio::time::timeout(CLOSE_GRACE, async {
        while let Some(Ok(_)) = ws.next().await {}
    })
    .await;
}

fn close_message(code: CloseCode, reason: &str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }))
}
