use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HelpdeskError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Interactive sign-in required: {0}")]
    InteractionRequired(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Ticket {0} is closed")]
    TicketClosed(u64),

    #[error("A workflow request is already in flight")]
    Busy,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("{0}")]
    Other(String),
}

impl HelpdeskError {
    /// Whether the query layer may retry the call that produced this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            HelpdeskError::Network(_) => true,
            HelpdeskError::Http { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }

    /// Map an HTTP status to the matching error kind.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => HelpdeskError::AuthenticationRequired,
            403 => HelpdeskError::Forbidden(message),
            _ => HelpdeskError::Http { status, message },
        }
    }
}

impl From<serde_json::Error> for HelpdeskError {
    fn from(e: serde_json::Error) -> Self {
        HelpdeskError::Serialization(e.to_string())
    }
}
