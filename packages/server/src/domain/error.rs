//! Domain error types.

use thiserror::Error;

/// Failure to hand one encoded frame to a connection's writer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The connection's writer task has stopped (peer gone or session closed)
    #[error("Connection '{0}' is no longer accepting messages")]
    ChannelClosed(String),

    /// The connection's outbound queue is full (peer is not reading)
    #[error("Outbound queue for connection '{0}' is full")]
    Full(String),
}

/// Reasons an inbound frame is dropped without being routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameRejection {
    /// Public chat body is empty after trimming
    #[error("Empty message")]
    Empty,

    /// `DM|` frame without the delimiter between target and body
    #[error("Malformed direct message: missing body delimiter")]
    MalformedDirect,
}
