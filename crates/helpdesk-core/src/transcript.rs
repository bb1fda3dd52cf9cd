//! Chat Transcript Store.
//!
//! Holds the in-progress AI conversation and its hand-off counters, and
//! persists them to durable storage so a reload does not lose the chat.
//! Human entries are appended as `Pending` and either confirmed or rolled
//! back when their workflow request resolves.

use std::cell::RefCell;
use std::rc::Rc;

use helpdesk_types::{
    config::TRANSCRIPT_STORAGE_KEY,
    message::{ChatEntry, ChatTranscript, EntryState},
    workflow::WorkflowRequest,
    Result,
};
use crate::ports::StoragePort;

/// Counters captured before a submission, restored on rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counters {
    turns_since_offer: u32,
    ticket_opened: bool,
    offer_ticket_action: bool,
}

/// A human turn whose workflow request is outstanding.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub request: WorkflowRequest,
    index: usize,
    epoch: u64,
    prior: Counters,
}

impl PendingTurn {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn text(&self) -> &str {
        self.request
            .conversation
            .get(self.index)
            .map(|(_, text)| text.as_str())
            .unwrap_or("")
    }
}

#[derive(Default)]
struct State {
    transcript: ChatTranscript,
    /// Bumped on every reset so late responses can be recognised
    epoch: u64,
}

/// Shared transcript state, clone-cheap via Rc.
#[derive(Clone, Default)]
pub struct TranscriptStore {
    inner: Rc<RefCell<State>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transcript(transcript: ChatTranscript) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().transcript = transcript;
        store
    }

    pub fn snapshot(&self) -> ChatTranscript {
        self.inner.borrow().transcript.clone()
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        self.inner.borrow().transcript.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn turns_since_offer(&self) -> u32 {
        self.inner.borrow().transcript.turns_since_offer
    }

    pub fn ticket_opened(&self) -> bool {
        self.inner.borrow().transcript.ticket_opened
    }

    pub fn offer_ticket_action(&self) -> bool {
        self.inner.borrow().transcript.offer_ticket_action
    }

    pub fn epoch(&self) -> u64 {
        self.inner.borrow().epoch
    }

    /// Append `text` as a pending human entry and snapshot the request.
    /// Any offered ticket action is withdrawn; rollback brings it back.
    pub fn begin_turn(&self, text: &str) -> PendingTurn {
        let mut state = self.inner.borrow_mut();
        let t = &mut state.transcript;
        let prior = Counters {
            turns_since_offer: t.turns_since_offer,
            ticket_opened: t.ticket_opened,
            offer_ticket_action: t.offer_ticket_action,
        };
        t.entries.push(ChatEntry::pending_human(text));
        t.offer_ticket_action = false;
        let index = t.entries.len() - 1;
        let request = WorkflowRequest::from_transcript(t);
        PendingTurn {
            request,
            index,
            epoch: state.epoch,
            prior,
        }
    }

    /// Mark the pending human entry as accepted by the backend.
    pub fn confirm(&self, pending: &PendingTurn) {
        let mut state = self.inner.borrow_mut();
        if let Some(entry) = state.transcript.entries.get_mut(pending.index) {
            entry.state = EntryState::Confirmed;
        }
    }

    /// Undo `begin_turn`: drop the pending entry and restore the counters.
    pub fn rollback(&self, pending: &PendingTurn) {
        let mut state = self.inner.borrow_mut();
        let t = &mut state.transcript;
        if t.entries.get(pending.index).is_some_and(ChatEntry::is_pending) {
            t.entries.remove(pending.index);
        }
        t.turns_since_offer = pending.prior.turns_since_offer;
        t.ticket_opened = pending.prior.ticket_opened;
        t.offer_ticket_action = pending.prior.offer_ticket_action;
    }

    pub fn push_assistant(&self, text: &str) {
        self.inner
            .borrow_mut()
            .transcript
            .entries
            .push(ChatEntry::assistant(text));
    }

    pub fn increment_turns(&self) {
        self.inner.borrow_mut().transcript.turns_since_offer += 1;
    }

    /// Record the backend's first ticket proposal for this transcript.
    pub fn offer_ticket(&self) {
        let mut state = self.inner.borrow_mut();
        let t = &mut state.transcript;
        t.ticket_opened = true;
        t.offer_ticket_action = true;
        t.turns_since_offer = 0;
    }

    /// Discard the conversation and counters in one step.
    pub fn reset(&self) {
        let mut state = self.inner.borrow_mut();
        state.transcript = ChatTranscript::new();
        state.epoch += 1;
    }

    // ─── Persistence ─────────────────────────────────────────

    pub async fn save(&self, storage: &dyn StoragePort) -> Result<()> {
        let data = serde_json::to_vec(&self.snapshot())?;
        storage.set(TRANSCRIPT_STORAGE_KEY, &data).await
    }

    /// Load the persisted transcript. Pending entries are dropped since
    /// their request died with the previous page; unreadable data is
    /// discarded.
    pub async fn load(&self, storage: &dyn StoragePort) -> Result<()> {
        let Some(data) = storage.get(TRANSCRIPT_STORAGE_KEY).await? else {
            return Ok(());
        };
        match serde_json::from_slice::<ChatTranscript>(&data) {
            Ok(transcript) => {
                let transcript = transcript.without_pending();
                log::info!("Restored chat transcript ({} entries)", transcript.len());
                self.inner.borrow_mut().transcript = transcript;
            }
            Err(e) => {
                log::warn!("Discarding unreadable chat transcript: {}", e);
                storage.delete(TRANSCRIPT_STORAGE_KEY).await?;
            }
        }
        Ok(())
    }
}
