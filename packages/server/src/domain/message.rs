//! Server → client messages and their wire encoding.
//!
//! | Message | Wire form |
//! |---|---|
//! | `UserList` | `USERS\|<name1>,<name2>,...\n` |
//! | `SystemNotice` | `SYS\|<text>\n` |
//! | `PublicChat` | `<sender>: <body>\n` |
//! | `DirectMessage` | `DM\|<sender>\|<body>` (no trailing newline) |

use super::Username;

const USERS_PREFIX: &str = "USERS|";
const SYS_PREFIX: &str = "SYS|";
const DM_PREFIX: &str = "DM|";

/// A message relayed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Full replacement of the online-user list
    UserList(Vec<String>),
    /// Join/leave notice
    SystemNotice(String),
    /// Public chat relayed to everyone but the sender
    PublicChat { sender: String, body: String },
    /// Private message relayed to a single user
    DirectMessage { sender: String, body: String },
}

impl OutboundMessage {
    pub fn user_list<'a>(names: impl IntoIterator<Item = &'a Username>) -> Self {
        Self::UserList(names.into_iter().map(|n| n.as_str().to_string()).collect())
    }

    pub fn joined(username: &Username) -> Self {
        Self::SystemNotice(format!("{} joined the chat.", username))
    }

    pub fn left(username: &Username) -> Self {
        Self::SystemNotice(format!("{} left the chat.", username))
    }

    pub fn public_chat(sender: &Username, body: &str) -> Self {
        Self::PublicChat {
            sender: sender.as_str().to_string(),
            body: body.to_string(),
        }
    }

    pub fn direct_message(sender: &Username, body: &str) -> Self {
        Self::DirectMessage {
            sender: sender.as_str().to_string(),
            body: body.to_string(),
        }
    }

    /// Encode into the exact bytes written to the socket.
    pub fn encode(&self) -> String {
        match self {
            Self::UserList(names) => format!("{}{}\n", USERS_PREFIX, names.join(",")),
            Self::SystemNotice(text) => format!("{}{}\n", SYS_PREFIX, text),
            Self::PublicChat { sender, body } => format!("{}: {}\n", sender, body),
            Self::DirectMessage { sender, body } => format!("{}{}|{}", DM_PREFIX, sender, body),
        }
    }

    /// Decode a single server frame with its trailing newline already removed.
    ///
    /// Returns `None` for text matching none of the four layouts.
    pub fn decode(frame: &str) -> Option<Self> {
        if let Some(rest) = frame.strip_prefix(USERS_PREFIX) {
            let names = if rest.is_empty() {
                Vec::new()
            } else {
                rest.split(',').map(str::to_string).collect()
            };
            return Some(Self::UserList(names));
        }
        if let Some(rest) = frame.strip_prefix(SYS_PREFIX) {
            return Some(Self::SystemNotice(rest.to_string()));
        }
        if let Some(rest) = frame.strip_prefix(DM_PREFIX) {
            let (sender, body) = rest.split_once('|')?;
            return Some(Self::DirectMessage {
                sender: sender.to_string(),
                body: body.to_string(),
            });
        }
        let (sender, body) = frame.split_once(": ")?;
        Some(Self::PublicChat {
            sender: sender.to_string(),
            body: body.to_string(),
        })
    }
}
