//! InMemory Connection Registry 実装
//!
//! 登録順を保持する `Vec` を 1 つの `Mutex` で保護します。
//! 全操作がロックを保持したまま完結するため、スナップショットが
//! 登録・削除の途中状態を観測することはありません。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, RegistryEntry, Username,
};

/// インメモリ Connection Registry 実装
#[derive(Debug, Default)]
pub struct InMemoryConnectionRegistry {
    /// 登録順のエントリ一覧
    entries: Mutex<Vec<RegistryEntry>>,
}

impl InMemoryConnectionRegistry {
    /// 空の InMemoryConnectionRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, handle: ConnectionHandle, username: Username) {
        let mut entries = self.entries.lock().await;
        match entries.iter_mut().find(|e| e.handle.id() == handle.id()) {
            Some(existing) => {
                tracing::debug!(
                    "Connection {} re-registered as '{}' (was '{}')",
                    handle.id(),
                    username,
                    existing.username
                );
                existing.handle = handle;
                existing.username = username;
            }
            None => {
                tracing::debug!("Connection {} registered as '{}'", handle.id(), username);
                entries.push(RegistryEntry { handle, username });
            }
        }
    }

    async fn unregister(&self, id: &ConnectionId) -> Option<Username> {
        let mut entries = self.entries.lock().await;
        let index = entries.iter().position(|e| e.handle.id() == *id)?;
        let removed = entries.remove(index);
        tracing::debug!("Connection {} ('{}') unregistered", id, removed.username);
        Some(removed.username)
    }

    async fn snapshot(&self) -> Vec<RegistryEntry> {
        let entries = self.entries.lock().await;
        entries.clone()
    }

    async fn find_by_username(&self, username: &str) -> Option<ConnectionHandle> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .find(|e| e.username.as_str() == username)
            .map(|e| e.handle.clone())
    }

    async fn count_connected(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.len()
    }
}
