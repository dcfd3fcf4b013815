//! UseCase layer
//!
//! セッションのライフサイクル（接続・切断）とフレームの中継を、
//! レジストリとルーターの組み合わせとして表現します。

mod connect_session;
mod disconnect_session;
mod relay_message;
mod router;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use relay_message::RelayMessageUseCase;
pub use router::{DeliveryReport, MessageRouter};
