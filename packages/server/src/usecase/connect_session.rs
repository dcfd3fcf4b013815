//! UseCase: セッション開始処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() / announce_arrival()
//!
//! ### なぜこのテストが必要か
//! - 入室時は「ユーザー一覧 → 入室通知」の順で、本人を含む全員に届く必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の参加者、2 人目の参加者

use std::sync::Arc;

use crate::domain::{ConnectionHandle, ConnectionRegistry, OutboundMessage, Username};

use super::{DeliveryReport, MessageRouter};

/// セッション開始のユースケース
pub struct ConnectSessionUseCase {
    /// Registry（接続とユーザー名の対応表の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// MessageRouter（配送）
    router: Arc<MessageRouter>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, router: Arc<MessageRouter>) -> Self {
        Self { registry, router }
    }

    /// ハンドシェイクが完了した接続をレジストリに登録
    pub async fn execute(&self, handle: ConnectionHandle, username: Username) {
        self.registry.register(handle, username).await;
    }

    /// 更新後のユーザー一覧と入室通知を全員（本人を含む）にブロードキャスト
    ///
    /// # Returns
    ///
    /// 入室通知の配送結果
    pub async fn announce_arrival(&self, username: &Username) -> DeliveryReport {
        self.router.broadcast_user_list().await;
        self.router
            .broadcast(&OutboundMessage::joined(username), None)
            .await
    }
}
