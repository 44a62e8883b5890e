//! Terminal chat client for the Matcha platform.
//!
//! Connects to the chat WebSocket, joins one room, and sends messages
//! from stdin. Reconnects automatically with a fixed delay for as long
//! as the access token is set.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin matcha-chat -- --token <TOKEN> --room general --user ada
//! ```
//!
//! With `--api-url` set, room history is fetched and the room marked
//! read before joining live events, as the product UI does.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use matcha_api::ApiClient;
use matcha_chat::formatter::MessageFormatter;
use matcha_chat::room::RoomSession;
use matcha_chat::ui::redisplay_prompt;
use matcha_chat::{ChannelSink, ChatSession, CredentialStore, RoomId, SessionConfig};
use matcha_shared::logger::setup_logger;
use matcha_shared::storage::FileStorage;

#[derive(Parser, Debug)]
#[command(name = "matcha-chat")]
#[command(about = "Terminal chat client for the Matcha platform", long_about = None)]
struct Args {
    /// Access token for the chat backend; falls back to the state file
    #[arg(short = 't', long)]
    token: Option<String>,

    /// State file holding the saved access token
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Display name used for the prompt
    #[arg(short = 'u', long, default_value = "me")]
    user: String,

    /// Chat WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws/chat")]
    url: String,

    /// REST API origin; when set, room history is loaded before joining
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let room = match RoomId::new(args.room) {
        Ok(room) => room,
        Err(e) => {
            tracing::error!("invalid room: {}", e);
            std::process::exit(1);
        }
    };

    let mut storage = args.state_file.as_ref().map(FileStorage::open);

    // --token wins; without it the token saved in the state file is used.
    let credentials = match (&args.token, &storage) {
        (Some(token), _) => CredentialStore::with_token(token),
        (None, Some(storage)) => CredentialStore::from_storage(storage),
        (None, None) => CredentialStore::new(),
    };
    let Some(token) = credentials.get() else {
        tracing::error!("no access token: pass --token, or --state-file with a saved token");
        std::process::exit(1);
    };
    if let Some(storage) = storage.as_mut() {
        credentials.persist_to(storage);
    }

    let (sink, mut events) = ChannelSink::new();
    let session = Arc::new(ChatSession::spawn(
        SessionConfig::new(&args.url),
        &credentials,
        Arc::new(sink),
    ));
    session.connect();

    // Print inbound events and keep the prompt on screen.
    let user_for_events = args.user.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = MessageFormatter::format_event(&event) {
                print!("{}", line);
                redisplay_prompt(&user_for_events);
            }
        }
    });

    if let Some(api_url) = &args.api_url {
        let api = Arc::new(ApiClient::new(api_url).with_token(&token));
        let mut room_session = RoomSession::new(session.clone(), api, room.clone());
        match room_session.enter().await {
            Ok(history) => {
                for message in &history {
                    println!(
                        "[{}] {}: {}",
                        message.room, message.sender, message.content
                    );
                }
            }
            Err(e) => {
                tracing::error!("failed to enter room '{}': {}", room, e.user_message());
                std::process::exit(1);
            }
        }
    } else {
        session.join_room(&room);
    }

    println!(
        "\nYou are '{}' in '{}'. Type messages and press Enter to send. Ctrl+C to exit.\n",
        args.user, room
    );

    // Rustyline is synchronous; feed lines through a channel from a
    // blocking thread.
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_user = args.user.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_user);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        if line == "/typing" {
            session.send_typing(&room);
        } else {
            session.send_message(&room, line);
        }
    }

    session.leave_room(&room);
    tracing::info!("exiting");
}
