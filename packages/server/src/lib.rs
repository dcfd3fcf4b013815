//! TCP chat relay library.
//!
//! Clients connect, announce a username, and exchange public broadcast
//! messages and private direct messages through a shared connection registry.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
