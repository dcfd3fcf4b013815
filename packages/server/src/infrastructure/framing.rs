//! Inbound framing: turning a byte stream into protocol frames.
//!
//! ## モード
//!
//! - `Raw`: 1 回の read（最大 `max_frame_len` バイト）を 1 フレームとみなす。
//!   長すぎるフレームや 1 回の read に複数フレームが入った場合は正しく扱えない。
//! - `Lines`: 改行区切りで再構成する。`max_frame_len` を超える行は破棄する。

use std::io;

use bytes::BytesMut;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::{Decoder, FramedRead, LinesCodec, LinesCodecError};

/// How inbound bytes are split into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FrameMode {
    /// One read call is one frame
    #[default]
    Raw,
    /// Newline-delimited frames
    Lines,
}

/// Errors produced while reading frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Transport failure; ends the session
    #[error("Read failed: {0}")]
    Io(#[from] io::Error),

    /// A line exceeded the maximum frame length and was discarded
    #[error("Frame exceeded {0} bytes and was discarded")]
    Oversized(usize),
}

/// Decoded unit of the line codec.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Frame(String),
    Oversized,
}

/// `LinesCodec` that reports oversized lines as items instead of errors.
///
/// `FramedRead` pauses after a decoder error, so the oversized case has to
/// stay on the `Ok` path for the lines buffered behind it to be delivered.
struct ChatLinesCodec {
    inner: LinesCodec,
}

impl ChatLinesCodec {
    fn new(max_frame_len: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_frame_len),
        }
    }

    fn map(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Line>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(Line::Frame)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Line::Oversized)),
            Err(e) => Err(e),
        }
    }
}

impl Decoder for ChatLinesCodec {
    type Item = Line;
    type Error = LinesCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        Self::map(self.inner.decode(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        Self::map(self.inner.decode_eof(src))
    }
}

enum Source<R> {
    Raw { reader: R, buf: Vec<u8> },
    Lines(FramedRead<R, ChatLinesCodec>),
}

/// Reads frames from the read half of a connection.
pub struct FrameReader<R> {
    source: Source<R>,
    max_frame_len: usize,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, mode: FrameMode, max_frame_len: usize) -> Self {
        let source = match mode {
            FrameMode::Raw => Source::Raw {
                reader,
                buf: vec![0; max_frame_len],
            },
            FrameMode::Lines => {
                Source::Lines(FramedRead::new(reader, ChatLinesCodec::new(max_frame_len)))
            }
        };
        Self {
            source,
            max_frame_len,
        }
    }

    /// Read the next frame.
    ///
    /// `Ok(None)` means the peer closed the stream.
    pub async fn next_frame(&mut self) -> Result<Option<String>, FrameError> {
        match &mut self.source {
            Source::Raw { reader, buf } => {
                let n = reader.read(buf).await?;
                if n == 0 {
                    return Ok(None);
                }
                Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
            }
            Source::Lines(framed) => match framed.next().await {
                None => Ok(None),
                Some(Ok(Line::Frame(line))) => Ok(Some(line)),
                Some(Ok(Line::Oversized)) => Err(FrameError::Oversized(self.max_frame_len)),
                Some(Err(LinesCodecError::Io(e))) => Err(FrameError::Io(e)),
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    Err(FrameError::Oversized(self.max_frame_len))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn test_raw_mode_one_read_is_one_frame() {
        // テスト項目: Raw モードでは 1 回の read がそのまま 1 フレームになる
        // given (前提条件):
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, FrameMode::Raw, 1024);

        // when (操作):
        client.write_all(b"alice").await.unwrap();
        let first = reader.next_frame().await.unwrap();

        // then (期待する結果):
        assert_eq!(first, Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_raw_mode_caps_frame_at_max_len() {
        // テスト項目: Raw モードでは max_frame_len を超える分は次のフレームになる
        // given (前提条件):
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, FrameMode::Raw, 4);

        // when (操作):
        client.write_all(b"abcdef").await.unwrap();
        let first = reader.next_frame().await.unwrap();
        let second = reader.next_frame().await.unwrap();

        // then (期待する結果):
        assert_eq!(first, Some("abcd".to_string()));
        assert_eq!(second, Some("ef".to_string()));
    }

    #[tokio::test]
    async fn test_raw_mode_end_of_stream() {
        // テスト項目: 相手が切断すると None が返る
        // given (前提条件):
        let (client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, FrameMode::Raw, 1024);

        // when (操作):
        drop(client);
        let result = reader.next_frame().await.unwrap();

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_raw_mode_decodes_invalid_utf8_lossily() {
        // テスト項目: 不正な UTF-8 は置換文字に変換される
        // given (前提条件):
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, FrameMode::Raw, 1024);

        // when (操作):
        client.write_all(&[b'h', 0xff, b'i']).await.unwrap();
        let frame = reader.next_frame().await.unwrap();

        // then (期待する結果):
        assert_eq!(frame, Some("h\u{fffd}i".to_string()));
    }

    #[tokio::test]
    async fn test_lines_mode_reassembles_and_splits() {
        // テスト項目: Lines モードでは分割・結合された送信が行単位に再構成される
        // given (前提条件):
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, FrameMode::Lines, 1024);

        // when (操作):
        client.write_all(b"ali").await.unwrap();
        client.write_all(b"ce\r\nhello\nDM|bob|hi\n").await.unwrap();
        drop(client);
        let mut frames = Vec::new();
        while let Some(frame) = reader.next_frame().await.unwrap() {
            frames.push(frame);
        }

        // then (期待する結果):
        assert_eq!(frames, vec!["alice", "hello", "DM|bob|hi"]);
    }

    #[tokio::test]
    async fn test_lines_mode_oversized_line_is_reported_and_skipped() {
        // テスト項目: 長すぎる行はエラーとして報告され、次の行は読める
        // given (前提条件):
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, FrameMode::Lines, 4);

        // when (操作):
        client.write_all(b"toolong\nok\n").await.unwrap();
        drop(client);
        let first = reader.next_frame().await;
        let second = reader.next_frame().await.unwrap();

        // then (期待する結果):
        assert!(matches!(first, Err(FrameError::Oversized(4))));
        assert_eq!(second, Some("ok".to_string()));
    }
}
