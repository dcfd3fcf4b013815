//! Client → server frame grammar.
//!
//! The first frame of a session is the handshake and is never parsed here;
//! see [`Username::from_handshake`](super::Username::from_handshake).

use super::FrameRejection;

const DM_PREFIX: &str = "DM|";

/// A routable inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// `DM|<target>|<body>`; body is kept verbatim
    Direct { target: String, body: String },
    /// Anything else, with trailing whitespace trimmed
    Public(String),
}

/// Parse one inbound frame received after the handshake.
pub fn parse_frame(raw: &str) -> Result<InboundFrame, FrameRejection> {
    if let Some(rest) = raw.strip_prefix(DM_PREFIX) {
        let (target, body) = rest
            .split_once('|')
            .ok_or(FrameRejection::MalformedDirect)?;
        return Ok(InboundFrame::Direct {
            target: target.to_string(),
            body: body.to_string(),
        });
    }

    let trimmed = raw.trim_end_matches([' ', '\n', '\r']);
    if trimmed.is_empty() {
        return Err(FrameRejection::Empty);
    }
    Ok(InboundFrame::Public(trimmed.to_string()))
}
