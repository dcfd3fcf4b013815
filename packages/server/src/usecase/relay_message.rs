//! UseCase: ハンドシェイク後のフレームの中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayMessageUseCase::execute()
//!
//! ### なぜこのテストが必要か
//! - 公開メッセージが送信者にエコーされないこと
//! - 空のメッセージ・不正な DM・存在しない宛先が黙って破棄されること

use std::sync::Arc;

use crate::domain::{
    ConnectionId, FrameRejection, InboundFrame, OutboundMessage, Username, parse_frame,
};

use super::{DeliveryReport, MessageRouter};

/// フレーム中継のユースケース
pub struct RelayMessageUseCase {
    /// MessageRouter（配送）
    router: Arc<MessageRouter>,
}

impl RelayMessageUseCase {
    /// 新しい RelayMessageUseCase を作成
    pub fn new(router: Arc<MessageRouter>) -> Self {
        Self { router }
    }

    /// 受信したフレームを解釈して配送
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 送信元の接続（公開メッセージの配送対象から除外）
    /// * `sender` - 送信元のユーザー名
    /// * `raw` - 受信したフレーム
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - 配送結果（宛先なしの DM は空の結果）
    /// * `Err(FrameRejection)` - 配送せずに破棄したフレーム
    pub async fn execute(
        &self,
        sender_id: ConnectionId,
        sender: &Username,
        raw: &str,
    ) -> Result<DeliveryReport, FrameRejection> {
        let report = match parse_frame(raw)? {
            InboundFrame::Direct { target, body } => {
                self.router.direct_message(&target, sender, &body).await
            }
            InboundFrame::Public(body) => {
                let message = OutboundMessage::public_chat(sender, &body);
                self.router.broadcast(&message, Some(sender_id)).await
            }
        };
        Ok(report)
    }
}
