//! Server configuration.

use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::framing::FrameMode;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 65432;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
/// Upper bound for `max_frame_len`; raw framing allocates this much per session
pub const MAX_FRAME_LEN_LIMIT: usize = 64 * 1024;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Idle timeout must be at least one second")]
    IdleTimeoutTooShort,

    #[error("Maximum frame length must be greater than zero")]
    ZeroFrameLength,

    #[error("Maximum frame length must not exceed {0} bytes")]
    FrameLengthTooLarge(usize),
}

/// Per-session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum time a single read may block before the session is reaped
    pub idle_timeout: Duration,
    /// How inbound bytes are split into frames
    pub frame_mode: FrameMode,
    /// Bytes per raw read, or maximum line length
    pub max_frame_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            frame_mode: FrameMode::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    /// Grace period for sessions to close after shutdown is requested
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session: SessionConfig::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// `host:port` string to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.idle_timeout < Duration::from_secs(1) {
            return Err(ConfigError::IdleTimeoutTooShort);
        }
        if self.session.max_frame_len == 0 {
            return Err(ConfigError::ZeroFrameLength);
        }
        if self.session.max_frame_len > MAX_FRAME_LEN_LIMIT {
            return Err(ConfigError::FrameLengthTooLarge(MAX_FRAME_LEN_LIMIT));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_wire_protocol() {
        // テスト項目: デフォルト設定はポート 65432・1024 バイトの raw フレーム
        // given (前提条件):
        let config = ServerConfig::default();

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:65432");
        assert_eq!(config.session.frame_mode, FrameMode::Raw);
        assert_eq!(config.session.max_frame_len, 1024);
    }

    #[test]
    fn test_validate_rejects_sub_second_idle_timeout() {
        // テスト項目: 1 秒未満のアイドルタイムアウトは設定エラーになる
        // given (前提条件):
        let mut zero = ServerConfig::default();
        zero.session.idle_timeout = Duration::ZERO;
        let mut short = ServerConfig::default();
        short.session.idle_timeout = Duration::from_millis(500);

        // when (操作):
        let results = [zero.validate(), short.validate()];

        // then (期待する結果):
        assert!(
            results
                .iter()
                .all(|r| *r == Err(ConfigError::IdleTimeoutTooShort))
        );
    }

    #[test]
    fn test_validate_rejects_zero_frame_length() {
        // テスト項目: フレーム長 0 は設定エラーになる
        // given (前提条件):
        let mut config = ServerConfig::default();
        config.session.max_frame_len = 0;

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(result, Err(ConfigError::ZeroFrameLength));
    }

    #[test]
    fn test_validate_rejects_oversized_frame_length() {
        // テスト項目: 上限を超えるフレーム長は設定エラーになり、上限ちょうどは許可される
        // given (前提条件):
        let mut too_large = ServerConfig::default();
        too_large.session.max_frame_len = MAX_FRAME_LEN_LIMIT + 1;
        let mut at_limit = ServerConfig::default();
        at_limit.session.max_frame_len = MAX_FRAME_LEN_LIMIT;

        // when (操作):
        let rejected = too_large.validate();
        let accepted = at_limit.validate();

        // then (期待する結果):
        assert_eq!(
            rejected,
            Err(ConfigError::FrameLengthTooLarge(MAX_FRAME_LEN_LIMIT))
        );
        assert!(accepted.is_ok());
    }
}
