//! UI layer: TCP acceptor and per-connection session handling.

mod server;
mod session;
mod signal;
mod state;

pub use server::{Server, ServerError};
pub use session::{CloseReason, run_session};
pub use signal::shutdown_signal;
pub use state::AppState;
