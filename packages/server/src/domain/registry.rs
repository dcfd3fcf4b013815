//! Connection registry trait 定義
//!
//! アクティブな接続とユーザー名の対応表へのインターフェースです。
//! UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しません。
//!
//! ## 排他制御
//!
//! 実装は全ての操作（登録・削除・スナップショット・検索）を同一の排他区間で
//! 実行しなければなりません。途中状態のエントリが観測されることはありません。

use async_trait::async_trait;

use super::{ConnectionHandle, ConnectionId, Username};

/// One registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub handle: ConnectionHandle,
    pub username: Username,
}

/// Shared mapping from connection to username.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Insert an entry, or overwrite the username if the connection is already registered.
    async fn register(&self, handle: ConnectionHandle, username: Username);

    /// Remove the entry for `id`, returning its username if it was present.
    async fn unregister(&self, id: &ConnectionId) -> Option<Username>;

    /// Point-in-time copy of all entries, in registration order.
    async fn snapshot(&self) -> Vec<RegistryEntry>;

    /// First connection registered under `username`, in registration order.
    ///
    /// Usernames are not unique; when they collide this is best-effort.
    async fn find_by_username(&self, username: &str) -> Option<ConnectionHandle>;

    /// Number of registered connections.
    async fn count_connected(&self) -> usize;
}
