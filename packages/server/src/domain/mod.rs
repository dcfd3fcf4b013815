//! Domain layer
//!
//! 接続・ユーザー名・ワイヤフォーマットといった、I/O を持たない中核モデルを定義します。
//! レジストリの具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

pub mod connection;
pub mod error;
pub mod frame;
pub mod message;
pub mod registry;
pub mod value_object;

pub use connection::{ConnectionHandle, OUTBOUND_QUEUE_CAPACITY, PusherChannel, outbound_channel};
pub use error::{DeliveryError, FrameRejection};
pub use frame::{InboundFrame, parse_frame};
pub use message::OutboundMessage;
pub use registry::{ConnectionRegistry, RegistryEntry};
pub use value_object::{ConnectionId, Username};

#[cfg(test)]
pub use registry::MockConnectionRegistry;
