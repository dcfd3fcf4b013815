//! Connection handle shared between a session and the router.
//!
//! ## 設計ノート
//!
//! ソケットへの書き込みは接続ごとに 1 つの writer タスクだけが行います。
//! ルーターは `PusherChannel` にエンコード済みのフレームを積むだけなので、
//! ブロードキャストと DM が競合してもバイト列が混ざることはありません。
//!
//! キューは有限です。受信しないピア宛てのフレームは `DeliveryError::Full` で破棄されます。

use tokio::sync::mpsc::{self, error::TrySendError};

use super::{ConnectionId, DeliveryError};

/// Channel feeding a connection's writer task with encoded frames
pub type PusherChannel = mpsc::Sender<String>;

/// Frames queued per connection before deliveries start failing
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Create the bounded queue between the router and one connection's writer.
pub fn outbound_channel() -> (PusherChannel, mpsc::Receiver<String>) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// Writable reference to one connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: PusherChannel,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: PusherChannel) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue one encoded frame for this connection.
    ///
    /// Never blocks; fails when the writer has stopped or its queue is full.
    pub fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        self.sender
            .try_send(payload.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full(self.id.to_string()),
                TrySendError::Closed(_) => DeliveryError::ChannelClosed(self.id.to_string()),
            })
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}
