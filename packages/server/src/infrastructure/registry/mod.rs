//! `ConnectionRegistry` の実装
//!
//! - `inmemory`: プロセス内メモリで保持する実装

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;
