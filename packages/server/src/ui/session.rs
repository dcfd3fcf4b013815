//! Per-connection session handler.
//!
//! ```text
//! AwaitingHandshake ──(first frame = username)──▶ Active ──(EOF / error / idle / shutdown)──▶ Closed
//!        │                                                                                   ▲
//!        └──────────────(EOF / error / idle / shutdown, never registered)────────────────────┘
//! ```
//!
//! Inbound frames are processed strictly in arrival order by a single read loop.
//! Outbound frames go through the connection's `PusherChannel` to one writer task.
//! A write that cannot complete within the idle timeout closes the session.

use std::{fmt, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::SessionConfig,
    domain::{ConnectionHandle, ConnectionId, Username, outbound_channel},
    infrastructure::framing::{FrameError, FrameReader},
};

use super::state::AppState;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed the stream
    PeerClosed,
    /// A read failed at the transport level
    ReadFailed,
    /// No frame arrived within the idle timeout
    IdleTimeout,
    /// The server is shutting down
    Shutdown,
    /// The writer task stopped (peer no longer accepts data)
    WriteFailed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::PeerClosed => "peer closed",
            Self::ReadFailed => "read failed",
            Self::IdleTimeout => "idle timeout",
            Self::Shutdown => "server shutdown",
            Self::WriteFailed => "write failed",
        };
        f.write_str(reason)
    }
}

enum ReadOutcome {
    Frame(String),
    Skipped(FrameError),
    Closed(CloseReason),
}

/// Run one client session to completion.
///
/// Returns the reason the session ended. A session that ends before the
/// handshake completes is never registered and produces no broadcast.
pub async fn run_session<S>(
    stream: S,
    peer: String,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> CloseReason
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = FrameReader::new(
        read_half,
        state.session.frame_mode,
        state.session.max_frame_len,
    );

    // AwaitingHandshake
    let username = loop {
        match next_frame(&mut reader, &state.session, &shutdown).await {
            ReadOutcome::Frame(raw) => break Username::from_handshake(&raw),
            ReadOutcome::Skipped(e) => {
                tracing::warn!("Dropped handshake frame from {}: {}", peer, e);
            }
            ReadOutcome::Closed(reason) => {
                tracing::info!("Connection from {} closed before handshake ({})", peer, reason);
                return reason;
            }
        }
    };

    // Active
    let id = ConnectionId::generate();
    let (tx, rx) = outbound_channel();
    let mut push_task = pusher_loop(rx, write_half, state.session.idle_timeout);

    state
        .connect_session_usecase
        .execute(ConnectionHandle::new(id, tx), username.clone())
        .await;
    tracing::info!("{} connected.", username);
    state
        .connect_session_usecase
        .announce_arrival(&username)
        .await;

    let reason = tokio::select! {
        reason = read_loop(&mut reader, id, &username, &state, &shutdown) => reason,
        _ = &mut push_task => CloseReason::WriteFailed,
    };

    // Closed
    state.disconnect_session_usecase.execute(&id).await;
    if !push_task.is_finished() {
        push_task.abort();
        let _ = push_task.await;
    }
    drop(reader);
    tracing::info!("{} disconnected. ({})", username, reason);
    state
        .disconnect_session_usecase
        .announce_departure(&username)
        .await;

    reason
}

async fn read_loop<R>(
    reader: &mut FrameReader<R>,
    id: ConnectionId,
    username: &Username,
    state: &AppState,
    shutdown: &CancellationToken,
) -> CloseReason
where
    R: AsyncRead + Unpin,
{
    loop {
        let raw = match next_frame(reader, &state.session, shutdown).await {
            ReadOutcome::Frame(raw) => raw,
            ReadOutcome::Skipped(e) => {
                tracing::warn!("Dropped frame from '{}': {}", username, e);
                continue;
            }
            ReadOutcome::Closed(reason) => return reason,
        };

        match state.relay_message_usecase.execute(id, username, &raw).await {
            Ok(report) => tracing::debug!(
                delivered = report.delivered,
                failed = report.failed,
                "Relayed frame from '{}'",
                username
            ),
            Err(rejection) => tracing::debug!("Dropped frame from '{}': {}", username, rejection),
        }
    }
}

/// Wait for the next frame, bounded by the idle timeout and the shutdown token.
async fn next_frame<R>(
    reader: &mut FrameReader<R>,
    config: &SessionConfig,
    shutdown: &CancellationToken,
) -> ReadOutcome
where
    R: AsyncRead + Unpin,
{
    tokio::select! {
        _ = shutdown.cancelled() => ReadOutcome::Closed(CloseReason::Shutdown),
        result = tokio::time::timeout(config.idle_timeout, reader.next_frame()) => match result {
            Err(_) => ReadOutcome::Closed(CloseReason::IdleTimeout),
            Ok(Ok(Some(raw))) => ReadOutcome::Frame(raw),
            Ok(Ok(None)) => ReadOutcome::Closed(CloseReason::PeerClosed),
            Ok(Err(FrameError::Io(e))) => {
                tracing::debug!("Read error: {}", e);
                ReadOutcome::Closed(CloseReason::ReadFailed)
            }
            Ok(Err(e @ FrameError::Oversized(_))) => ReadOutcome::Skipped(e),
        },
    }
}

/// Spawns the task that drains the connection's channel into its write half.
///
/// This is the only writer of the socket, so frames from concurrent
/// broadcasts and direct messages never interleave.
fn pusher_loop<W>(
    mut rx: mpsc::Receiver<String>,
    mut writer: W,
    write_timeout: Duration,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match tokio::time::timeout(write_timeout, writer.write_all(frame.as_bytes())).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!("Write error: {}", e);
                    return;
                }
                Err(_) => {
                    tracing::warn!("Write stalled for {:?}, closing connection", write_timeout);
                    return;
                }
            }
        }
        let _ = writer.shutdown().await;
    })
}
