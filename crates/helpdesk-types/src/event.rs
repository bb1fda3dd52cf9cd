use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::route::Route;
use crate::ticket::{Technician, Ticket, TicketList};

/// Events emitted by background tasks and controllers.
/// The UI drains these once per frame.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Switch the active view
    Navigate(Route),

    /// Show a transient toast
    Notify(Notification),

    /// Session was established, refreshed or cleared
    SessionChanged,

    /// Chat transcript mutated (entry appended, rolled back, reset)
    TranscriptChanged,

    /// A workflow request started or finished
    WorkflowBusy(bool),

    /// Technician backlog page loaded
    TicketsLoaded(TicketList),

    /// Caller-scoped ticket page loaded
    MyTicketsLoaded(TicketList),

    /// Ticket detail fetched or updated locally
    TicketLoaded(Ticket),

    TechniciansLoaded(Vec<Technician>),

    /// A query failed after its retries
    LoadFailed { what: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient notification ("toast")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, "Error", description)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, description)
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, description)
    }

    /// Age in whole milliseconds at `now`
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_milliseconds()
    }
}
