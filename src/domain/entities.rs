//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/archive types here; adapters map into these.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::DomainError;

/// Tag used on the wire for chat messages. Every other tag is a system notification.
const MESSAGE_TAG: &str = "message";

/// One calendar day of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Display date (ISO `YYYY-MM-DD` when the export date could be normalized).
    pub date: String,
    /// Items in original export order.
    pub content: Vec<ChatItem>,
}

impl ChatEntry {
    pub fn new(date: impl Into<String>, content: Vec<ChatItem>) -> Self {
        Self {
            date: date.into(),
            content,
        }
    }

    /// Iterate only the chat messages of this day.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.content.iter().filter_map(|item| match item {
            ChatItem::Message(m) => Some(m),
            ChatItem::SystemNotification(_) => None,
        })
    }
}

/// A single record within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChatItem", into = "RawChatItem")]
pub enum ChatItem {
    Message(Message),
    SystemNotification(SystemNotification),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: String,
    pub message: String,
    pub timestamp: String,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotification {
    /// Notification tag (`joined`, `settings`, `added`, ...).
    pub kind: String,
    pub message: String,
}

/// Flat wire shape: `{"type": "...", "message": "...", ...}`.
#[derive(Serialize, Deserialize)]
struct RawChatItem {
    #[serde(rename = "type")]
    kind: String,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(
        rename = "isCurrentUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    is_current_user: Option<bool>,
}

impl TryFrom<RawChatItem> for ChatItem {
    type Error = DomainError;

    fn try_from(raw: RawChatItem) -> Result<Self, Self::Error> {
        if raw.kind != MESSAGE_TAG {
            return Ok(ChatItem::SystemNotification(SystemNotification {
                kind: raw.kind,
                message: raw.message,
            }));
        }
        let sender = raw
            .sender
            .ok_or_else(|| DomainError::Parse("message item without sender".to_string()))?;
        Ok(ChatItem::Message(Message {
            sender,
            message: raw.message,
            timestamp: raw.timestamp.unwrap_or_default(),
            is_current_user: raw.is_current_user.unwrap_or(false),
        }))
    }
}

impl From<ChatItem> for RawChatItem {
    fn from(item: ChatItem) -> Self {
        match item {
            ChatItem::Message(m) => RawChatItem {
                kind: MESSAGE_TAG.to_string(),
                message: m.message,
                sender: Some(m.sender),
                timestamp: Some(m.timestamp),
                is_current_user: Some(m.is_current_user),
            },
            ChatItem::SystemNotification(n) => RawChatItem {
                kind: n.kind,
                message: n.message,
                sender: None,
                timestamp: None,
                is_current_user: None,
            },
        }
    }
}

/// Word frequency produced by topic extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordStat {
    pub word: String,
    pub count: usize,
}

/// Messages sent by one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderCount {
    pub sender: String,
    pub count: usize,
}

/// Supported export containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Zip,
    Text,
}

impl ExportKind {
    /// Detect the container from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, DomainError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("zip") => Ok(ExportKind::Zip),
            Some("txt") => Ok(ExportKind::Text),
            _ => Err(DomainError::UnsupportedFile(
                "Please select a valid ZIP or TXT file exported from WhatsApp".to_string(),
            )),
        }
    }
}

/// A user-selected export file, already validated.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub path: PathBuf,
    pub kind: ExportKind,
}

impl ExportFile {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let kind = ExportKind::from_path(&path)?;
        Ok(Self { path, kind })
    }

    /// File name for display and upload; falls back to the full path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of loading an export through a chat source.
#[derive(Debug, Clone, Default)]
pub struct LoadedChat {
    pub entries: Vec<ChatEntry>,
    /// Server-side handle for follow-up AI queries (remote sources only).
    pub session_id: Option<String>,
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// Remote assistant reply.
    Remote,
    /// Offline mode; the local analyzer is the only engine.
    Local,
    /// Remote assistant failed or returned nothing; local analyzer stood in.
    Fallback,
}

/// Text shown to the user in reply to a question. May contain `**bold**`,
/// `*italic*` and newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}
