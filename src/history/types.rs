use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One chat message. Content only changes while a response is streaming in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub has_files: bool,
    #[serde(default)]
    pub is_topic_boundary: bool,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
            has_files: false,
            is_topic_boundary: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_files(mut self) -> Self {
        self.has_files = true;
        self
    }

    #[must_use]
    pub fn topic_boundary(mut self) -> Self {
        self.is_topic_boundary = true;
        self
    }

    /// Append a streamed chunk.
    pub fn append(&mut self, chunk: &str) {
        self.content.push_str(chunk);
    }
}

/// A chat as held by the UI. `messages` may be only the most recent suffix
/// of the history; the rest lives in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub has_compressed_history: bool,
    #[serde(default)]
    pub total_message_count: usize,
}

impl Chat {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            has_compressed_history: false,
            total_message_count: 0,
        }
    }

    pub fn from_messages(id: impl Into<String>, messages: Vec<Message>) -> Self {
        let total_message_count = messages.len();
        Self {
            id: id.into(),
            messages,
            has_compressed_history: false,
            total_message_count,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.total_message_count += 1;
    }

    /// Messages that live in the archive rather than in `messages`.
    pub fn archived_count(&self) -> usize {
        self.total_message_count.saturating_sub(self.messages.len())
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// Archived form of a [`Message`]: false flags are omitted and content is
/// whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompactMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_files: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_topic_boundary: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl From<&Message> for CompactMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: normalize_whitespace(&message.content),
            timestamp: message.timestamp,
            has_files: message.has_files,
            is_topic_boundary: message.is_topic_boundary,
        }
    }
}

impl From<CompactMessage> for Message {
    fn from(compact: CompactMessage) -> Self {
        Self {
            role: compact.role,
            content: compact.content,
            timestamp: compact.timestamp,
            has_files: compact.has_files,
            is_topic_boundary: compact.is_topic_boundary,
        }
    }
}

/// Trim trailing blanks from every line and collapse three or more
/// consecutive newlines into one blank line. Leading indentation is kept so
/// code blocks survive.
pub(crate) fn normalize_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut newline_run = 0usize;
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            newline_run += 1;
            if newline_run <= 2 {
                out.push('\n');
            }
        }
        let line = line.trim_end_matches([' ', '\t', '\r']);
        if !line.is_empty() {
            newline_run = 0;
            out.push_str(line);
        }
    }
    out
}
