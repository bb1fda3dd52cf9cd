use serde::{Deserialize, Serialize};

/// Sort order on creation date. Absent means the backend default (DESC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Asc => "Creation Date ASC",
            SortOrder::Desc => "Creation Date DESC",
        }
    }
}

/// Filter predicate for browsing the ticket backlog.
///
/// An absent key means "no constraint", never "default value". The store
/// replaces the whole predicate on every change; the `with_*` helpers build
/// the next complete value for the caller to hand over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TicketFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TicketFilter {
    /// Initial predicate of the technician portal: open tickets only.
    pub fn open_only() -> Self {
        Self {
            closed: Some(false),
            ..Self::default()
        }
    }

    pub fn with_assignee(&self, assignee_id: Option<String>) -> Self {
        Self {
            assignee_id,
            ..self.clone()
        }
    }

    pub fn with_closed(&self, closed: Option<bool>) -> Self {
        Self {
            closed,
            ..self.clone()
        }
    }

    pub fn with_order(&self, order: Option<SortOrder>) -> Self {
        Self {
            order,
            ..self.clone()
        }
    }

    /// Empty search text removes the key.
    pub fn with_search(&self, search: &str) -> Self {
        Self {
            search: if search.is_empty() {
                None
            } else {
                Some(search.to_string())
            },
            ..self.clone()
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self.closed {
            Some(true) => "Closed",
            Some(false) => "Opened",
            None => "All",
        }
    }
}

/// Page selector, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }
}

/// Document posted to the paged list endpoints: predicate plus page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketQuery {
    #[serde(flatten)]
    pub filter: TicketFilter,
    #[serde(flatten)]
    pub page: PageRequest,
}

impl TicketQuery {
    pub fn new(filter: TicketFilter, page: PageRequest) -> Self {
        Self { filter, page }
    }
}
