//! Infrastructure layer
//!
//! - `registry`: ドメイン層の `ConnectionRegistry` trait の実装
//! - `framing`: ソケットからの受信バイト列をフレームに切り出す処理

pub mod framing;
pub mod registry;
