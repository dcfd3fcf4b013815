//! Terminal chat client for a ChatRelay server.
//!
//! Connects over TCP, sends the username as the first frame, then relays
//! typed lines to the server and prints what the server sends back.
//! There is no reconnection; the client exits when the connection drops.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatrelay-client -- --username alice
//! cargo run --bin chatrelay-client -- -n bob -a 127.0.0.1:65432
//! ```

use std::sync::Arc;

use clap::Parser;

use chatrelay_client::run_client_session;
use chatrelay_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "chatrelay-client")]
#[command(about = "Terminal client for the ChatRelay TCP chat server", long_about = None)]
struct Args {
    /// Username announced to the other participants
    #[arg(short = 'n', long)]
    username: String,

    /// Server address
    #[arg(short = 'a', long, default_value = "127.0.0.1:65432")]
    addr: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    if let Err(e) = run_client_session(&args.addr, &args.username, Arc::new(SystemClock)).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
