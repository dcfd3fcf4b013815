//! Domain logic for client-side operations.
//!
//! This module contains pure functions for turning user input into wire
//! frames and server bytes into frames, making them easy to test.

/// What to do with one line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Send this frame to the server
    Send(String),
    /// Leave the chat
    Quit,
    /// Input was a command with missing arguments
    Usage(&'static str),
}

const DM_USAGE: &str = "usage: /dm <user> <message>";

/// Interpret a line typed at the prompt.
///
/// * `/quit` leaves the chat
/// * `/dm <user> <message>` sends `DM|<user>|<message>`
/// * anything else is sent as a public message
pub fn parse_input(line: &str) -> InputCommand {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.trim() == "/quit" {
        return InputCommand::Quit;
    }

    if let Some(rest) = line.strip_prefix("/dm") {
        if !rest.is_empty() && !rest.starts_with(' ') {
            return InputCommand::Send(format!("{}\n", line));
        }
        let mut parts = rest.trim_start().splitn(2, ' ');
        return match (parts.next(), parts.next()) {
            (Some(target), Some(body)) if !target.is_empty() && !body.trim().is_empty() => {
                InputCommand::Send(format!("DM|{}|{}\n", target, body))
            }
            _ => InputCommand::Usage(DM_USAGE),
        };
    }

    InputCommand::Send(format!("{}\n", line))
}

/// Reassembles server frames that arrive split across reads.
///
/// Newline-terminated frames are released once complete. The server sends
/// direct messages without a trailing newline, so a pending `DM|` frame that
/// already names its sender is released at the end of each chunk.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    pending: Vec<u8>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the bytes of one read and take every frame they complete.
    ///
    /// Bytes are buffered undecoded, so a UTF-8 sequence split across reads
    /// is reassembled before being decoded (lossily).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
                frames.push(line.to_string());
            }
        }

        let is_direct = self
            .pending
            .strip_prefix(b"DM|")
            .is_some_and(|rest| rest.contains(&b'|'));
        if is_direct {
            let frame = std::mem::take(&mut self.pending);
            frames.push(String::from_utf8_lossy(&frame).into_owned());
        }

        frames
    }
}
