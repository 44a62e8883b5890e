//! WebSocket session management: connection state, reconnection, and
//! frame dispatch.
//!
//! One [`ChatSession`] owns one live socket. All mutable state (the
//! socket, the connection state, the heartbeat and reconnect timers)
//! lives on a dedicated task; the handle only passes commands to it.
//! The heartbeat interval exists only inside the connected loop and the
//! reconnect sleep only inside the reconnecting loop, so neither can
//! outlive its state or exist twice.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::credential::CredentialStore;
use crate::event::{ChatEvent, EventSink};
use crate::protocol::{self, ClientFrame, RoomId, ServerFrame};

/// Period between application-level keepalive pings.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Fixed delay before a reconnect attempt. Constant, uncapped retry:
/// reconnection continues until the credential disappears or the
/// session is told to disconnect.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle state, observable through [`ChatSession::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// A reconnect attempt is pending.
    Reconnecting,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_reconnecting(&self) -> bool {
        matches!(self, ConnectionState::Reconnecting)
    }
}

/// Session configuration.
///
/// The intervals are constants in production; tests shrink them.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket endpoint, e.g. `ws://app.matcha.dev/ws/chat`.
    pub url: String,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

enum Command {
    Connect,
    Disconnect,
    Send(ClientFrame),
    Shutdown,
}

/// Handle to a running chat session.
///
/// Dropping the handle shuts the session task down, cancelling any
/// pending reconnect and closing the socket.
pub struct ChatSession {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ChatSession {
    /// Spawn the session task.
    ///
    /// The session observes `credentials` for the lifetime of the task:
    /// a token appearing forces a connect, a token disappearing forces a
    /// disconnect. Nothing happens until either a token appears or
    /// [`connect`](Self::connect) is called.
    pub fn spawn(
        config: SessionConfig,
        credentials: &CredentialStore,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let worker = SessionWorker {
            config,
            // Holding a store clone keeps the watch channel open for as
            // long as the session observes it.
            store: credentials.clone(),
            credentials: credentials.subscribe(),
            sink,
            cmd_rx,
            state_tx,
        };
        let task = tokio::spawn(worker.run());
        Self {
            cmd_tx,
            state_rx,
            task: Some(task),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state changes (e.g. to render a "reconnecting"
    /// indicator).
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Open the connection. No-op while already connected or connecting,
    /// and no-op while no credential is present (wait-for-login).
    pub fn connect(&self) {
        let _ = self.cmd_tx.send(Command::Connect);
    }

    /// Close the connection and cancel any pending reconnect. Idempotent.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    /// Transmit a frame if the socket is currently open.
    ///
    /// There is no outbound queue: frames sent while not connected are
    /// dropped, and re-sending is the caller's decision.
    pub fn send(&self, frame: ClientFrame) {
        let _ = self.cmd_tx.send(Command::Send(frame));
    }

    /// Subscribe to a room's live events.
    pub fn join_room(&self, room: &RoomId) {
        self.send(ClientFrame::JoinRoom { room: room.clone() });
    }

    /// Unsubscribe from a room's live events.
    pub fn leave_room(&self, room: &RoomId) {
        self.send(ClientFrame::LeaveRoom { room: room.clone() });
    }

    /// Post a message to a room.
    pub fn send_message(&self, room: &RoomId, content: impl Into<String>) {
        self.send(ClientFrame::Message {
            room: room.clone(),
            content: content.into(),
        });
    }

    /// Send an ephemeral typing indicator for a room.
    pub fn send_typing(&self, room: &RoomId) {
        self.send(ClientFrame::Typing { room: room.clone() });
    }

    /// Shut the session down and wait for the task to finish.
    pub async fn shutdown(mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

/// Why the connected (or connecting) phase ended.
enum LoopExit {
    /// Transport closed or errored underneath us.
    Closed,
    /// Manual `disconnect()`.
    Disconnected,
    /// The credential disappeared (cross-tab logout).
    CredentialCleared,
    Shutdown,
}

enum ReconnectOutcome {
    Retry,
    Cancelled,
    Shutdown,
}

struct SessionWorker {
    config: SessionConfig,
    store: CredentialStore,
    credentials: watch::Receiver<Option<String>>,
    sink: Arc<dyn EventSink>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
}

impl SessionWorker {
    async fn run(mut self) {
        'idle: loop {
            self.set_state(ConnectionState::Disconnected);

            // Wait for an explicit connect or a credential appearing.
            loop {
                tokio::select! {
                    cmd = self.cmd_rx.recv() => match cmd {
                        Some(Command::Connect) => {
                            if self.credential().is_some() {
                                break;
                            }
                            tracing::debug!("connect requested without credential; waiting for login");
                        }
                        Some(Command::Disconnect) => {} // already disconnected
                        Some(Command::Send(frame)) => drop_frame(&frame),
                        Some(Command::Shutdown) | None => break 'idle,
                    },
                    changed = self.credentials.changed() => {
                        let _ = changed;
                        if self.credential().is_some() {
                            tracing::debug!("credential appeared; connecting");
                            break;
                        }
                    }
                }
            }

            // Connect, drive, and reconnect until logout, manual
            // disconnect, or shutdown.
            loop {
                match self.connect_once().await {
                    LoopExit::Closed => {
                        if self.credential().is_none() {
                            continue 'idle;
                        }
                        self.set_state(ConnectionState::Reconnecting);
                        match self.await_reconnect().await {
                            ReconnectOutcome::Retry => {}
                            ReconnectOutcome::Cancelled => continue 'idle,
                            ReconnectOutcome::Shutdown => break 'idle,
                        }
                    }
                    LoopExit::Disconnected | LoopExit::CredentialCleared => continue 'idle,
                    LoopExit::Shutdown => break 'idle,
                }
            }
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// One connection attempt plus, on success, the connected phase.
    async fn connect_once(&mut self) -> LoopExit {
        let Some(token) = self.credential() else {
            return LoopExit::CredentialCleared;
        };
        self.set_state(ConnectionState::Connecting);

        let url = format!("{}?token={}", self.config.url, token);
        let ws = match connect_async(&url).await {
            Ok((ws, _response)) => ws,
            Err(e) => {
                tracing::warn!("connection attempt failed: {}", e);
                return LoopExit::Closed;
            }
        };

        tracing::info!("connected to chat backend");
        self.set_state(ConnectionState::Connected);
        self.sink.deliver(ChatEvent::Connected);

        let exit = self.drive(ws).await;
        self.sink.deliver(ChatEvent::Disconnected);
        exit
    }

    /// The connected phase: heartbeat, inbound dispatch, outbound sends.
    async fn drive(&mut self, ws: WsStream) -> LoopExit {
        let (mut write, mut read) = ws.split();

        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick resolves immediately; the first ping
        // should go out one full period after connect.
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    match protocol::encode_frame(&ClientFrame::Ping) {
                        Ok(json) => {
                            if let Err(e) = write.send(Message::Text(json.into())).await {
                                tracing::warn!("heartbeat send failed: {}", e);
                                return LoopExit::Closed;
                            }
                        }
                        Err(e) => tracing::error!("failed to serialize ping frame: {}", e),
                    }
                }
                inbound = read.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_text(self.sink.as_ref(), &text);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("server closed the connection");
                        return LoopExit::Closed;
                    }
                    // Binary frames and transport-level ping/pong are not
                    // part of the chat protocol.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("websocket read error: {}", e);
                        return LoopExit::Closed;
                    }
                },
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(frame)) => {
                        match protocol::encode_frame(&frame) {
                            Ok(json) => {
                                if let Err(e) = write.send(Message::Text(json.into())).await {
                                    tracing::warn!("send failed: {}", e);
                                    return LoopExit::Closed;
                                }
                            }
                            Err(e) => tracing::error!("failed to serialize frame: {}", e),
                        }
                    }
                    Some(Command::Connect) => {} // already connected
                    Some(Command::Disconnect) => {
                        let _ = write.close().await;
                        return LoopExit::Disconnected;
                    }
                    Some(Command::Shutdown) | None => {
                        let _ = write.close().await;
                        return LoopExit::Shutdown;
                    }
                },
                changed = self.credentials.changed() => {
                    let _ = changed;
                    if self.credential().is_none() {
                        tracing::info!("credential cleared; disconnecting");
                        let _ = write.close().await;
                        return LoopExit::CredentialCleared;
                    }
                }
            }
        }
    }

    /// The reconnect-pending phase: exactly one armed sleep.
    async fn await_reconnect(&mut self) -> ReconnectOutcome {
        tracing::info!("reconnecting in {:?}", self.config.reconnect_delay);
        let delay = tokio::time::sleep(self.config.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return ReconnectOutcome::Retry,
                cmd = self.cmd_rx.recv() => match cmd {
                    // An attempt is already pending; a second sleep is
                    // never armed.
                    Some(Command::Connect) => {}
                    Some(Command::Disconnect) => return ReconnectOutcome::Cancelled,
                    Some(Command::Send(frame)) => drop_frame(&frame),
                    Some(Command::Shutdown) | None => return ReconnectOutcome::Shutdown,
                },
                changed = self.credentials.changed() => {
                    let _ = changed;
                    if self.credential().is_none() {
                        tracing::info!("credential cleared; abandoning reconnect");
                        return ReconnectOutcome::Cancelled;
                    }
                }
            }
        }
    }

    fn credential(&self) -> Option<String> {
        self.store.get()
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }
}

/// Decode one inbound text payload and deliver its event, if any.
fn dispatch_text(sink: &dyn EventSink, text: &str) {
    if let Some(event) = protocol::decode_frame(text).and_then(ServerFrame::into_event) {
        sink.deliver(event);
    }
}

fn drop_frame(frame: &ClientFrame) {
    tracing::debug!("dropping outbound frame while not connected: {:?}", frame);
}
