use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Literal assignee id the backend uses for "nobody".
pub const UNASSIGNED: &str = "Unassigned";

/// A support case, owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: u64,
    pub title: String,
    pub content: String,
    #[serde(with = "timestamp")]
    pub creation_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub closed_date: Option<DateTime<Utc>>,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default)]
    pub assignee_name: Option<String>,
    #[serde(default)]
    pub similar_tickets: Vec<SimilarTicket>,
    #[serde(default)]
    pub ticket_messages: Vec<TicketMessage>,
}

impl Ticket {
    pub fn is_closed(&self) -> bool {
        self.closed_date.is_some()
    }

    pub fn display_title(&self) -> String {
        clean_display_text(&self.title)
    }

    pub fn display_body(&self) -> String {
        clean_display_text(&self.content)
    }

    /// First sentence of the body, shown on list cards.
    pub fn summary(&self) -> String {
        let body = self.content.replace('"', "");
        match body.find('.') {
            Some(idx) => body[..=idx].to_string(),
            None => String::new(),
        }
    }

    pub fn assignee_label(&self) -> &str {
        self.assignee_name.as_deref().unwrap_or(UNASSIGNED)
    }
}

/// One message in a ticket's thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub message: String,
    pub author_name: String,
    #[serde(default)]
    pub group: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A solved ticket the backend considers related
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarTicket {
    pub id: u64,
    #[serde(default)]
    pub distance: f64,
    pub entity: SimilarTicketEntity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarTicketEntity {
    pub title: String,
}

/// One page of tickets plus the total match count
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TicketList {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

impl TicketList {
    /// Number of pages at the given page size, never less than one.
    pub fn page_count(&self, page_size: u32) -> u32 {
        if page_size == 0 {
            return 1;
        }
        let pages = self.count.div_ceil(page_size as u64);
        pages.clamp(1, u32::MAX as u64) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technician {
    pub user_id: String,
    pub user_name: String,
}

// ─── Mutation documents ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicketMessage {
    pub ticket_id: u64,
    pub message: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketAssignee {
    pub ticket_id: u64,
    pub assignee_id: String,
}

impl TicketAssignee {
    pub fn new(ticket_id: u64, assignee_id: Option<&str>) -> Self {
        Self {
            ticket_id,
            assignee_id: assignee_id.unwrap_or(UNASSIGNED).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketId {
    pub ticket_id: u64,
}

// ─── Display helpers ─────────────────────────────────────────

/// Expand literal `\n` sequences and strip the quotes the backend leaves
/// around JSON-encoded ticket text.
pub fn clean_display_text(raw: &str) -> String {
    raw.replace("\\n", "\n").replace('"', "")
}

/// Render a timestamp like `March 4, 2025 2:07 PM`, or `N/A`.
pub fn format_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.format("%B %-d, %Y %-I:%M %p").to_string(),
        None => "N/A".to_string(),
    }
}

/// Timestamps arrive either as RFC 3339 or as naive `YYYY-MM-DDTHH:MM:SS`
/// (database columns without offset, read as UTC).
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(t) => s.serialize_some(&t.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
            }
        }
    }
}
