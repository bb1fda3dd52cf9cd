use serde::{Deserialize, Serialize};

/// Who said a line of the AI conversation.
/// Wire names follow the workflow backend: `"human"` and `"ai"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

impl Speaker {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Speaker::Human => "human",
            Speaker::Assistant => "ai",
        }
    }
}

/// Lifecycle of a transcript entry.
/// A human entry is `Pending` while its workflow request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    #[default]
    Confirmed,
    Pending,
}

/// A single line in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub state: EntryState,
}

impl ChatEntry {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
            state: EntryState::Confirmed,
        }
    }

    pub fn pending_human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
            state: EntryState::Pending,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            state: EntryState::Confirmed,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == EntryState::Pending
    }
}

/// The in-progress AI conversation plus its hand-off counters.
///
/// This is the value persisted to durable browser storage; the store in
/// `helpdesk-core` owns all mutation rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub entries: Vec<ChatEntry>,
    /// Assistant turns since the backend last proposed a ticket
    #[serde(default)]
    pub turns_since_offer: u32,
    /// Set once the backend has proposed a ticket for this transcript
    #[serde(default)]
    pub ticket_opened: bool,
    /// Whether the "create ticket" action is currently offered
    #[serde(default)]
    pub offer_ticket_action: bool,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(ChatEntry::is_pending)
    }

    /// Drop entries whose request never resolved (e.g. lost on page reload).
    pub fn without_pending(mut self) -> Self {
        self.entries.retain(|e| !e.is_pending());
        self
    }
}
