//! Terminal client for the ChatRelay wire protocol.

pub mod domain;
pub mod error;
pub mod formatter;
pub mod session;
pub mod ui;

pub use session::run_client_session;
