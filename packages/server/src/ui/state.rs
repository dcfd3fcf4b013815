//! Shared application state handed to every session.

use std::sync::Arc;

use crate::{
    config::SessionConfig,
    usecase::{ConnectSessionUseCase, DisconnectSessionUseCase, RelayMessageUseCase},
};

/// Shared application state
pub struct AppState {
    /// ConnectSessionUseCase（セッション開始のユースケース）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション終了のユースケース）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// RelayMessageUseCase（フレーム中継のユースケース）
    pub relay_message_usecase: Arc<RelayMessageUseCase>,
    /// Per-session settings
    pub session: SessionConfig,
}
