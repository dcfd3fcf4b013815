//! UseCase: セッション終了処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() / announce_departure()
//!
//! ### なぜこのテストが必要か
//! - 退室した接続が一覧から消え、残りの参加者に通知されることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の退室と通知
//! - エッジケース：最後の参加者の退室（通知対象なし）
//! - 異常系：未登録の接続の退室

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, OutboundMessage, Username};

use super::{DeliveryReport, MessageRouter};

/// セッション終了のユースケース
pub struct DisconnectSessionUseCase {
    /// Registry（接続とユーザー名の対応表の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// MessageRouter（配送）
    router: Arc<MessageRouter>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, router: Arc<MessageRouter>) -> Self {
        Self { registry, router }
    }

    /// 接続をレジストリから削除
    ///
    /// # Returns
    ///
    /// * `Some(Username)` - 削除された接続のユーザー名
    /// * `None` - 未登録の接続（何もしない）
    pub async fn execute(&self, id: &ConnectionId) -> Option<Username> {
        self.registry.unregister(id).await
    }

    /// 更新後のユーザー一覧と退室通知を残りの参加者にブロードキャスト
    ///
    /// # Returns
    ///
    /// 退室通知の配送結果
    pub async fn announce_departure(&self, username: &Username) -> DeliveryReport {
        self.router.broadcast_user_list().await;
        self.router
            .broadcast(&OutboundMessage::left(username), None)
            .await
    }
}
