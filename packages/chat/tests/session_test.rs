//! Integration tests for the chat session against an in-process
//! WebSocket server.
//!
//! The server records every accepted connection and every received text
//! frame, can be told to drop the first N connections right after
//! accepting them, and can push scripted frames to the client. Timers
//! in the session config are shrunk so reconnect behavior is observable
//! within a test run.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::mpsc;

use matcha_chat::{
    ChannelSink, ChatEvent, ChatSession, ConnectionState, CredentialStore, RoomId, SessionConfig,
};

struct ServerState {
    accepted: AtomicUsize,
    received: Mutex<Vec<String>>,
    /// Connections (0-based) below this index are dropped right after
    /// the upgrade completes.
    close_first: usize,
    /// Frames pushed to the client on every connection that stays open.
    push_on_connect: Vec<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<ServerState>) {
    let index = state.accepted.fetch_add(1, Ordering::SeqCst);
    if index < state.close_first {
        // Dropping the socket closes the connection.
        return;
    }

    for frame in &state.push_on_connect {
        if socket
            .send(Message::Text(frame.clone().into()))
            .await
            .is_err()
        {
            return;
        }
    }

    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            state.received.lock().unwrap().push(text.to_string());
        }
    }
}

/// In-process chat server the session under test connects to.
struct TestServer {
    url: String,
    state: Arc<ServerState>,
}

impl TestServer {
    async fn start(close_first: usize, push_on_connect: Vec<String>) -> Self {
        let state = Arc::new(ServerState {
            accepted: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            close_first,
            push_on_connect,
        });

        let app = Router::new()
            .route("/ws/chat", get(ws_handler))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        TestServer {
            url: format!("ws://{}/ws/chat", addr),
            state,
        }
    }

    fn accepted(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    fn received(&self) -> Vec<String> {
        self.state.received.lock().unwrap().clone()
    }
}

/// Session config with timers shrunk for tests.
fn test_config(url: &str) -> SessionConfig {
    SessionConfig {
        url: url.to_string(),
        heartbeat_interval: Duration::from_millis(50),
        reconnect_delay: Duration::from_millis(100),
    }
}

/// Config whose heartbeat never fires within a test run, for tests that
/// assert on the exact frames the server received.
fn quiet_config(url: &str) -> SessionConfig {
    SessionConfig {
        heartbeat_interval: Duration::from_secs(600),
        ..test_config(url)
    }
}

fn spawn_session(
    config: SessionConfig,
    credentials: &CredentialStore,
) -> (ChatSession, mpsc::UnboundedReceiver<ChatEvent>) {
    let (sink, events) = ChannelSink::new();
    let session = ChatSession::spawn(config, credentials, Arc::new(sink));
    (session, events)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<ChatEvent>) -> ChatEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("Timed out waiting for event")
        .expect("Event channel closed")
}

/// Assert that no event arrives within `window`.
async fn assert_no_event(events: &mut mpsc::UnboundedReceiver<ChatEvent>, window: Duration) {
    let result = tokio::time::timeout(window, events.recv()).await;
    assert!(result.is_err(), "unexpected event: {:?}", result.unwrap());
}

fn room(id: &str) -> RoomId {
    RoomId::new(id).unwrap()
}

#[tokio::test]
async fn test_connect_twice_opens_single_socket() {
    // given:
    let server = TestServer::start(0, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);

    // when: connect() twice without an intervening close
    session.connect();
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // then: the second call was a no-op
    assert_eq!(server.accepted(), 1);
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_connect_without_credential_is_a_noop() {
    // given: logged out
    let server = TestServer::start(0, vec![]).await;
    let credentials = CredentialStore::new();
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);

    // when:
    session.connect();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // then: wait-for-login, not an error
    assert_eq!(server.accepted(), 0);
    assert_eq!(session.state(), ConnectionState::Disconnected);

    // when: the credential appears, the session connects by itself
    credentials.set("tok-1");
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    assert_eq!(server.accepted(), 1);
}

#[tokio::test]
async fn test_reconnects_after_transport_close() {
    // given: the server drops the first connection right away
    let server = TestServer::start(1, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);

    // when:
    session.connect();

    // then: open, drop, one delayed retry that sticks
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    assert_eq!(next_event(&mut events).await, ChatEvent::Disconnected);
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.accepted(), 2);
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_connect_during_pending_delay_adds_no_second_attempt() {
    // given: first connection dropped, reconnect pending
    let server = TestServer::start(1, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    assert_eq!(next_event(&mut events).await, ChatEvent::Disconnected);

    // when: connecting again before the delay elapses
    session.connect();
    tokio::time::sleep(Duration::from_millis(400)).await;

    // then: still exactly one retry
    assert_eq!(server.accepted(), 2);
}

#[tokio::test]
async fn test_shutdown_while_reconnecting_cancels_pending_attempt() {
    // given: the server drops every connection, so the session is
    // permanently cycling through reconnects
    let server = TestServer::start(usize::MAX, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    assert_eq!(next_event(&mut events).await, ChatEvent::Disconnected);

    // when:
    session.shutdown().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let accepted_after_shutdown = server.accepted();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // then: a forced time-advance opens no new socket
    assert_eq!(server.accepted(), accepted_after_shutdown);
}

#[tokio::test]
async fn test_manual_disconnect_cancels_reconnect() {
    // given:
    let server = TestServer::start(usize::MAX, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    assert_eq!(next_event(&mut events).await, ChatEvent::Disconnected);

    // when:
    session.disconnect();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let accepted_after_disconnect = server.accepted();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // then: no further attempts, and disconnect stays idempotent
    assert_eq!(server.accepted(), accepted_after_disconnect);
    session.disconnect();
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_malformed_frame_invokes_no_callback_and_keeps_connection() {
    // given: the server pushes garbage followed by a valid frame
    let server = TestServer::start(
        0,
        vec![
            "{invalid".to_string(),
            r#"{"type":"typing","room":"general","user":{"id":"u1","display_name":"Ada"}}"#
                .to_string(),
        ],
    )
    .await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);

    // when:
    session.connect();

    // then: the garbage produced no event and did not close anything;
    // the frame after it still arrives
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    let event = next_event(&mut events).await;
    assert!(matches!(event, ChatEvent::Typing { .. }));
    assert_no_event(&mut events, Duration::from_millis(200)).await;
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_message_frame_missing_room_invokes_no_callback() {
    // given: a message frame without its room field, a pong, then a
    // valid message frame
    let server = TestServer::start(
        0,
        vec![
            r#"{"type":"message","message":{"id":"m1","sender":{"id":"u1","display_name":"Ada"},"content":"lost","sent_at":1672531200000}}"#.to_string(),
            r#"{"type":"pong"}"#.to_string(),
            r#"{"type":"message","room":"general","message":{"id":"m2","sender":{"id":"u1","display_name":"Ada"},"content":"kept","sent_at":1672531200000}}"#.to_string(),
        ],
    )
    .await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);

    // when:
    session.connect();

    // then: only the complete frame is delivered
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    match next_event(&mut events).await {
        ChatEvent::Message { message, .. } => assert_eq!(message.content, "kept"),
        other => panic!("unexpected event: {:?}", other),
    }
    assert_no_event(&mut events, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_heartbeat_pings_only_while_connected() {
    // given: a 50 ms heartbeat
    let server = TestServer::start(0, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(test_config(&server.url), &credentials);
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);

    // when:
    tokio::time::sleep(Duration::from_millis(180)).await;

    // then: periodic pings while connected
    let pings = server.received();
    assert!(
        pings.len() >= 2,
        "expected at least 2 pings, got {:?}",
        pings
    );
    assert!(pings.iter().all(|frame| frame == r#"{"type":"ping"}"#));

    // and none after disconnect
    session.disconnect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Disconnected);
    let count_at_disconnect = server.received().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.received().len(), count_at_disconnect);
}

#[tokio::test]
async fn test_credential_clear_disconnects_and_set_reconnects() {
    // given: a connected session
    let server = TestServer::start(0, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);

    // when: the credential disappears (logout in another tab)
    credentials.clear();

    // then: forced disconnect, no reconnect attempts
    assert_eq!(next_event(&mut events).await, ChatEvent::Disconnected);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.state(), ConnectionState::Disconnected);
    assert_eq!(server.accepted(), 1);

    // when: the credential reappears (login)
    credentials.set("tok-2");

    // then: forced connect
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    assert_eq!(server.accepted(), 2);
}

#[tokio::test]
async fn test_send_while_disconnected_drops_the_frame() {
    // given: a session that never connected
    let server = TestServer::start(0, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);

    // when: sending before connecting, then connecting
    session.send_message(&room("general"), "typed while offline");
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // then: there is no outbound queue, the frame never reaches the server
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_room_commands_reach_server_in_caller_order() {
    // given:
    let server = TestServer::start(0, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);

    // when:
    let general = room("general");
    session.join_room(&general);
    session.send_message(&general, "hi");
    session.send_typing(&general);
    session.leave_room(&general);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // then:
    assert_eq!(
        server.received(),
        vec![
            r#"{"type":"join_room","room":"general"}"#.to_string(),
            r#"{"type":"message","room":"general","content":"hi"}"#.to_string(),
            r#"{"type":"typing","room":"general"}"#.to_string(),
            r#"{"type":"leave_room","room":"general"}"#.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_dropping_the_handle_stops_the_session() {
    // given: a session cycling through reconnects
    let server = TestServer::start(usize::MAX, vec![]).await;
    let credentials = CredentialStore::with_token("tok-1");
    let (session, mut events) = spawn_session(quiet_config(&server.url), &credentials);
    session.connect();
    assert_eq!(next_event(&mut events).await, ChatEvent::Connected);
    assert_eq!(next_event(&mut events).await, ChatEvent::Disconnected);

    // when: the owning context goes away without calling shutdown
    drop(session);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let accepted_after_drop = server.accepted();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // then: no timer keeps reconnecting on behalf of nobody
    assert_eq!(server.accepted(), accepted_after_drop);
}
