//! Conversation Orchestrator.
//!
//! Drives one workflow-advance round trip per human utterance:
//!
//! ```text
//! submit(text) ─► begin (pending entry, busy) ─► POST /init_ai_workflow ─► resolve
//!                                                                         ├─ ticket_id  → reset, navigate to ticket
//!                                                                         ├─ proposal   → reply, offer action, turns = 0
//!                                                                         ├─ reply      → reply, turns += 1
//!                                                                         └─ failure    → rollback, toast
//! ```
//!
//! At most one request is in flight; a second submission fails with
//! `HelpdeskError::Busy`. A response that arrives after a reset is
//! discarded.

use std::cell::Cell;
use std::rc::Rc;

use helpdesk_types::{
    event::{ClientEvent, Notification},
    route::Route,
    workflow::{WorkflowResponse, CREATE_TICKET_PROMPT},
    HelpdeskError, Result,
};
use crate::event_bus::EventBus;
use crate::gateway::{Endpoint, RemoteGateway};
use crate::ports::StoragePort;
use crate::session::SessionStore;
use crate::transcript::{PendingTurn, TranscriptStore};

const WORKFLOW_FAILED: &str = "The AI failed to respond. Please try again.";

/// What kind of turn is currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Message,
    CreateTicket,
}

/// How a submission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty input; nothing was sent
    Ignored,
    Replied,
    /// First ticket proposal for this transcript; the action is now offered
    TicketOffered,
    TicketCreated(u64),
    /// The transcript was reset while the request was outstanding
    Discarded,
}

/// Clone-cheap handle; clones share all state.
#[derive(Clone)]
pub struct ConversationOrchestrator {
    transcript: TranscriptStore,
    session: SessionStore,
    gateway: Rc<RemoteGateway>,
    storage: Rc<dyn StoragePort>,
    bus: EventBus,
    in_flight: Rc<Cell<Option<TurnKind>>>,
}

impl ConversationOrchestrator {
    pub fn new(
        transcript: TranscriptStore,
        session: SessionStore,
        gateway: Rc<RemoteGateway>,
        storage: Rc<dyn StoragePort>,
        bus: EventBus,
    ) -> Self {
        Self {
            transcript,
            session,
            gateway,
            storage,
            bus,
            in_flight: Rc::new(Cell::new(None)),
        }
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.get().is_some()
    }

    pub fn is_generating_ticket(&self) -> bool {
        self.in_flight.get() == Some(TurnKind::CreateTicket)
    }

    /// Free-text input is accepted only when idle and no ticket action is
    /// waiting for the user.
    pub fn accepts_text(&self) -> bool {
        !self.is_busy() && !self.transcript.offer_ticket_action()
    }

    /// Submit one human utterance and wait for the backend's answer.
    pub async fn submit(&self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }
        let pending = self.begin(text)?;
        self.persist().await;

        let credential = self.session.credential();
        let result = self
            .gateway
            .get_filtered::<_, WorkflowResponse>(
                Endpoint::AiWorkflow,
                &pending.request,
                credential.as_ref(),
            )
            .await;

        self.resolve(pending, result).await
    }

    /// Accept the offered ticket: a synthetic utterance on the same path.
    pub async fn create_ticket(&self) -> Result<TurnOutcome> {
        self.submit(CREATE_TICKET_PROMPT).await
    }

    /// Discard the conversation. Any outstanding response will be ignored.
    pub async fn reset(&self) {
        self.transcript.reset();
        if self.in_flight.take().is_some() {
            self.bus.emit(ClientEvent::WorkflowBusy(false));
        }
        log::info!("Chat transcript reset");
        self.bus.emit(ClientEvent::TranscriptChanged);
        self.persist().await;
    }

    /// Load the persisted transcript, if any.
    pub async fn restore(&self) -> Result<()> {
        self.transcript.load(self.storage.as_ref()).await?;
        self.bus.emit(ClientEvent::TranscriptChanged);
        Ok(())
    }

    // ─── Turn lifecycle ──────────────────────────────────────

    /// Claim the single in-flight slot and append the pending entry.
    /// Runs synchronously so two submissions cannot interleave.
    fn begin(&self, text: &str) -> Result<PendingTurn> {
        if self.is_busy() {
            log::debug!("Workflow request already in flight; submission rejected");
            return Err(HelpdeskError::Busy);
        }
        let kind = if text == CREATE_TICKET_PROMPT {
            TurnKind::CreateTicket
        } else {
            TurnKind::Message
        };
        self.in_flight.set(Some(kind));
        let pending = self.transcript.begin_turn(text);
        log::debug!(
            "Workflow turn started ({:?}, {} entries, execution_count={}, ticket={})",
            kind,
            pending.request.conversation.len(),
            pending.request.execution_count,
            pending.request.ticket
        );
        self.bus.emit(ClientEvent::WorkflowBusy(true));
        self.bus.emit(ClientEvent::TranscriptChanged);
        Ok(pending)
    }

    async fn resolve(
        &self,
        pending: PendingTurn,
        result: Result<WorkflowResponse>,
    ) -> Result<TurnOutcome> {
        if pending.epoch() != self.transcript.epoch() {
            log::debug!("Dropping workflow response for a reset transcript");
            return Ok(TurnOutcome::Discarded);
        }
        self.in_flight.set(None);
        self.bus.emit(ClientEvent::WorkflowBusy(false));

        let outcome = match result {
            Ok(response) => Ok(self.apply(&pending, response)),
            Err(e) => {
                self.transcript.rollback(&pending);
                log::warn!("Workflow request failed, turn rolled back: {}", e);
                if matches!(e, HelpdeskError::AuthenticationRequired) {
                    self.session.expire(&self.bus);
                } else {
                    self.bus.notify(Notification::error(WORKFLOW_FAILED));
                }
                Err(e)
            }
        };

        self.bus.emit(ClientEvent::TranscriptChanged);
        self.persist().await;
        outcome
    }

    fn apply(&self, pending: &PendingTurn, response: WorkflowResponse) -> TurnOutcome {
        if let Some(ticket_id) = response.ticket_id {
            self.transcript.reset();
            log::info!("Ticket {} created from conversation", ticket_id);
            self.bus.notify(Notification::success(
                "Ticket created",
                format!("Ticket #{} has been created.", ticket_id),
            ));
            self.bus.navigate(Route::Ticket(ticket_id));
            return TurnOutcome::TicketCreated(ticket_id);
        }

        self.transcript.confirm(pending);
        self.transcript.push_assistant(&response.llm_output);
        if response.ticket && !self.transcript.ticket_opened() {
            self.transcript.offer_ticket();
            TurnOutcome::TicketOffered
        } else {
            self.transcript.increment_turns();
            TurnOutcome::Replied
        }
    }

    async fn persist(&self) {
        if let Err(e) = self.transcript.save(self.storage.as_ref()).await {
            log::warn!("Failed to persist chat transcript: {}", e);
        }
    }
}
