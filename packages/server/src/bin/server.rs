//! TCP chat relay server.
//!
//! Relays public messages to every other connected client and direct messages
//! (`DM|<user>|<text>`) to a single client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatrelay-server
//! cargo run --bin chatrelay-server -- --host 127.0.0.1 --port 7000 --framing lines
//! ```

use std::{sync::Arc, time::Duration};

use chatrelay_server::{
    config::{ServerConfig, SessionConfig},
    infrastructure::{framing::FrameMode, registry::InMemoryConnectionRegistry},
    ui::{AppState, Server, shutdown_signal},
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, MessageRouter, RelayMessageUseCase,
    },
};
use chatrelay_shared::logger::setup_logger;
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "chatrelay-server")]
#[command(about = "TCP chat relay with broadcast and direct messages", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = chatrelay_server::config::DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = chatrelay_server::config::DEFAULT_PORT)]
    port: u16,

    /// Seconds a client may stay silent before its session is closed
    #[arg(long, default_value_t = chatrelay_server::config::DEFAULT_IDLE_TIMEOUT.as_secs())]
    idle_timeout_secs: u64,

    /// How inbound bytes are split into frames
    #[arg(long, value_enum, default_value_t = FrameMode::Raw)]
    framing: FrameMode,

    /// Bytes per read in raw framing, maximum line length in lines framing
    #[arg(long, default_value_t = chatrelay_server::config::DEFAULT_MAX_FRAME_LEN)]
    max_frame_len: usize,

    /// Seconds to wait for sessions to close on shutdown
    #[arg(long, default_value_t = chatrelay_server::config::DEFAULT_SHUTDOWN_TIMEOUT.as_secs())]
    shutdown_timeout_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            session: SessionConfig {
                idle_timeout: Duration::from_secs(args.idle_timeout_secs),
                frame_mode: args.framing,
                max_frame_len: args.max_frame_len,
            },
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::from(Args::parse());
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    // Initialize dependencies in order:
    // 1. Registry
    // 2. Router
    // 3. UseCases
    // 4. AppState
    // 5. Server

    // 1. Create Registry (in-memory)
    let registry = Arc::new(InMemoryConnectionRegistry::new());

    // 2. Create Router
    let router = Arc::new(MessageRouter::new(registry.clone()));

    // 3. Create UseCases
    let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(
        registry.clone(),
        router.clone(),
    ));
    let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(
        registry.clone(),
        router.clone(),
    ));
    let relay_message_usecase = Arc::new(RelayMessageUseCase::new(router));

    // 4. Create AppState
    let app_state = Arc::new(AppState {
        connect_session_usecase,
        disconnect_session_usecase,
        relay_message_usecase,
        session: config.session.clone(),
    });

    // 5. Bind and run the server
    let server = match Server::bind(&config, app_state).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    server.run(shutdown).await;
}
