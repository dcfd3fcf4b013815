//! TCP acceptor with supervised sessions.

use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::config::ServerConfig;

use super::{session::run_session, state::AppState};

/// Back-off after a failed `accept` (e.g. file descriptor exhaustion)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Fatal server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening endpoint could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The bound address could not be read back
    #[error("Failed to read local address: {0}")]
    LocalAddr(#[source] io::Error),
}

/// Chat relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::bind(&config, app_state).await?;
/// server.run(shutdown_token).await;
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Bind the listening socket.
    pub async fn bind(config: &ServerConfig, state: Arc<AppState>) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        Ok(Self {
            listener,
            local_addr,
            state,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// The address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` is cancelled, then wait for sessions to close.
    ///
    /// Every session is spawned on a `TaskTracker` and observes a child of
    /// `shutdown`, so cancelling it ends all sessions' read loops.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!("Chat relay server listening on {}", self.local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let sessions = TaskTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                        }
                        sessions.spawn(run_session(
                            stream,
                            peer.to_string(),
                            self.state.clone(),
                            shutdown.child_token(),
                        ));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        sessions.close();
        tracing::info!(
            sessions = sessions.len(),
            timeout_secs = self.shutdown_timeout.as_secs(),
            "Waiting for sessions to close"
        );
        if tokio::time::timeout(self.shutdown_timeout, sessions.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                "Shutdown timed out after {:?}, {} sessions still running",
                self.shutdown_timeout,
                sessions.len()
            );
        }

        tracing::info!("Server shutdown complete");
    }
}
