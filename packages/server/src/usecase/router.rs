//! Message router: fan-out of encoded messages over the registry.
//!
//! ルーターは状態を持たず、毎回レジストリのスナップショットから配送先を決定します。
//! ある宛先への配送失敗は他の宛先への配送を妨げません。

use std::sync::Arc;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, OutboundMessage, Username,
};

/// Outcome of one routing operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the message was queued for
    pub delivered: usize,
    /// Connections whose writer had stopped or whose queue was full
    pub failed: usize,
}

/// Routes broadcast, user-list and direct messages.
pub struct MessageRouter {
    /// Registry（接続とユーザー名の対応表の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Send the current user list to every registered connection.
    pub async fn broadcast_user_list(&self) -> DeliveryReport {
        let entries = self.registry.snapshot().await;
        let message = OutboundMessage::user_list(entries.iter().map(|e| &e.username));
        deliver_all(entries.iter().map(|e| &e.handle), &message.encode())
    }

    /// Send `message` to every registered connection except `exclude`.
    pub async fn broadcast(
        &self,
        message: &OutboundMessage,
        exclude: Option<ConnectionId>,
    ) -> DeliveryReport {
        let entries = self.registry.snapshot().await;
        let targets = entries
            .iter()
            .map(|e| &e.handle)
            .filter(|handle| Some(handle.id()) != exclude);
        deliver_all(targets, &message.encode())
    }

    /// Send a direct message to the first connection registered as `target`.
    ///
    /// Unknown targets are dropped silently.
    pub async fn direct_message(
        &self,
        target: &str,
        sender: &Username,
        body: &str,
    ) -> DeliveryReport {
        let Some(handle) = self.registry.find_by_username(target).await else {
            tracing::debug!(
                "Direct message from '{}' to unknown user '{}' dropped",
                sender,
                target
            );
            return DeliveryReport::default();
        };
        let message = OutboundMessage::direct_message(sender, body);
        deliver_all(std::iter::once(&handle), &message.encode())
    }
}

fn deliver_all<'a>(
    targets: impl IntoIterator<Item = &'a ConnectionHandle>,
    payload: &str,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for handle in targets {
        match handle.deliver(payload) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::warn!("Failed to deliver to connection {}: {}", handle.id(), e);
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::{MockConnectionRegistry, RegistryEntry},
        infrastructure::registry::InMemoryConnectionRegistry,
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - broadcast_user_list / broadcast / direct_message の配送先と内容
    // - 一部の宛先が切断済みでも残りに配送されること
    //
    // 【なぜこのテストが必要か】
    // - 送信者に自分のメッセージがエコーされないことを保証する
    // - DM が宛先以外に漏れないことを保証する
    // ========================================

    fn create_test_entry(name: &str) -> (RegistryEntry, mpsc::Receiver<String>) {
        let (tx, rx) = crate::domain::outbound_channel();
        let entry = RegistryEntry {
            handle: ConnectionHandle::new(ConnectionId::generate(), tx),
            username: Username::from(name),
        };
        (entry, rx)
    }

    #[tokio::test]
    async fn test_broadcast_user_list_reaches_everyone() {
        // テスト項目: ユーザー一覧が登録順で全員に届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (alice, mut alice_rx) = create_test_entry("alice");
        let (bob, mut bob_rx) = create_test_entry("bob");
        registry.register(alice.handle, alice.username).await;
        registry.register(bob.handle, bob.username).await;
        let router = MessageRouter::new(registry);

        // when (操作):
        let report = router.broadcast_user_list().await;

        // then (期待する結果):
        assert_eq!(report, DeliveryReport { delivered: 2, failed: 0 });
        assert_eq!(alice_rx.recv().await, Some("USERS|alice,bob\n".to_string()));
        assert_eq!(bob_rx.recv().await, Some("USERS|alice,bob\n".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        // テスト項目: exclude に指定した接続にはメッセージが届かない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (alice, mut alice_rx) = create_test_entry("alice");
        let (bob, mut bob_rx) = create_test_entry("bob");
        let (carol, mut carol_rx) = create_test_entry("carol");
        let alice_id = alice.handle.id();
        for entry in [alice, bob, carol] {
            registry.register(entry.handle, entry.username).await;
        }
        let router = MessageRouter::new(registry);

        // when (操作):
        let message = OutboundMessage::public_chat(&Username::from("alice"), "hello there");
        let report = router.broadcast(&message, Some(alice_id)).await;

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert_eq!(bob_rx.recv().await, Some("alice: hello there\n".to_string()));
        assert_eq!(carol_rx.recv().await, Some("alice: hello there\n".to_string()));
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_without_exclude_includes_everyone() {
        // テスト項目: exclude なしのブロードキャストは本人にも届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (alice, mut alice_rx) = create_test_entry("alice");
        registry.register(alice.handle, alice.username.clone()).await;
        let router = MessageRouter::new(registry);

        // when (操作):
        let report = router
            .broadcast(&OutboundMessage::joined(&alice.username), None)
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(
            alice_rx.recv().await,
            Some("SYS|alice joined the chat.\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure_does_not_stop_delivery() {
        // テスト項目: 切断済みの宛先があっても残りの宛先には配送される
        // given (前提条件):
        let (alice, alice_rx) = create_test_entry("alice");
        let (bob, mut bob_rx) = create_test_entry("bob");
        drop(alice_rx);
        let entries = vec![alice, bob];
        let mut registry = MockConnectionRegistry::new();
        registry
            .expect_snapshot()
            .times(1)
            .returning(move || entries.clone());
        let router = MessageRouter::new(Arc::new(registry));

        // when (操作):
        let message = OutboundMessage::SystemNotice("carol left the chat.".to_string());
        let report = router.broadcast(&message, None).await;

        // then (期待する結果):
        assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });
        assert_eq!(
            bob_rx.recv().await,
            Some("SYS|carol left the chat.\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_broadcast_counts_full_queue_as_failure() {
        // テスト項目: 受信しないピアのキューが埋まると、その宛先への配送は失敗として数えられる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (alice, _alice_rx) = create_test_entry("alice");
        let (bob, mut bob_rx) = create_test_entry("bob");
        registry.register(alice.handle, alice.username).await;
        registry.register(bob.handle, bob.username).await;
        let router = MessageRouter::new(registry);
        let message = OutboundMessage::public_chat(&Username::from("carol"), "hi");
        for _ in 0..crate::domain::OUTBOUND_QUEUE_CAPACITY {
            router.broadcast(&message, None).await;
            bob_rx.recv().await;
        }

        // when (操作):
        let report = router.broadcast(&message, None).await;

        // then (期待する結果):
        assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });
        assert_eq!(bob_rx.recv().await, Some("carol: hi\n".to_string()));
    }

    #[tokio::test]
    async fn test_direct_message_reaches_only_target() {
        // テスト項目: DM は宛先の接続にだけ "DM|sender|body" で届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (alice, mut alice_rx) = create_test_entry("alice");
        let (bob, mut bob_rx) = create_test_entry("bob");
        let (carol, mut carol_rx) = create_test_entry("carol");
        for entry in [alice, bob, carol] {
            registry.register(entry.handle, entry.username).await;
        }
        let router = MessageRouter::new(registry);

        // when (操作):
        let report = router
            .direct_message("bob", &Username::from("alice"), "hello")
            .await;

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(bob_rx.recv().await, Some("DM|alice|hello".to_string()));
        assert!(alice_rx.try_recv().is_err());
        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_direct_message_to_unknown_user_is_dropped() {
        // テスト項目: 存在しない宛先への DM は誰にも配送されない
        // given (前提条件):
        let mut registry = MockConnectionRegistry::new();
        registry
            .expect_find_by_username()
            .with(eq("nobody"))
            .times(1)
            .returning(|_| None);
        registry.expect_snapshot().never();
        let router = MessageRouter::new(Arc::new(registry));

        // when (操作):
        let report = router
            .direct_message("nobody", &Username::from("alice"), "hi")
            .await;

        // then (期待する結果):
        assert_eq!(report, DeliveryReport::default());
    }
}
