//! Utilities shared by the ChatRelay server and client binaries.

pub mod logger;
pub mod time;
