use serde::{Deserialize, Serialize};

use crate::message::{ChatEntry, ChatTranscript};

/// Fixed utterance sent when the user accepts the ticket proposal.
pub const CREATE_TICKET_PROMPT: &str = "Please create a Ticket.";

/// Snapshot sent to `POST /init_ai_workflow` on every human turn.
///
/// `conversation` is a list of `[speaker, text]` pairs, matching the
/// backend's tuple encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub conversation: Vec<(String, String)>,
    pub execution_count: u32,
    pub ticket: bool,
}

impl WorkflowRequest {
    pub fn from_transcript(transcript: &ChatTranscript) -> Self {
        Self {
            conversation: transcript
                .entries
                .iter()
                .map(|e: &ChatEntry| (e.speaker.as_wire().to_string(), e.text.clone()))
                .collect(),
            execution_count: transcript.turns_since_offer,
            ticket: transcript.ticket_opened,
        }
    }
}

/// Reply of the workflow backend.
///
/// Either `ticket_id` is set (a ticket was created) or `llm_output`
/// carries the assistant's reply; `ticket` flags a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowResponse {
    #[serde(default)]
    pub llm_output: String,
    #[serde(default)]
    pub ticket: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_content: Option<String>,
}

impl WorkflowResponse {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            llm_output: text.into(),
            ..Self::default()
        }
    }

    pub fn proposal(text: impl Into<String>) -> Self {
        Self {
            llm_output: text.into(),
            ticket: true,
            ..Self::default()
        }
    }

    pub fn created(ticket_id: u64) -> Self {
        Self {
            ticket_id: Some(ticket_id),
            ..Self::default()
        }
    }
}
