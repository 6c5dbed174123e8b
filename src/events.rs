use serde::Serialize;
use tokio::sync::broadcast;

/// Bus capacity. Notification sends are slow compared to event production,
/// so keep enough headroom that a mail-API hiccup does not drop events.
pub const EVENT_BUS_CAPACITY: usize = 256;

pub type EventBus = broadcast::Sender<DomainEvent>;

#[must_use]
pub fn event_bus() -> EventBus {
    broadcast::channel(EVENT_BUS_CAPACITY).0
}

/// Facts emitted after a state change has been committed. Payloads are
/// self-contained snapshots so consumers never re-read mutable state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    RegistrationCompleted {
        email: String,
        first_name: String,
        token: String,
    },
    PasswordResetRequested {
        email: String,
        token: String,
    },
    DocumentAdded {
        account_name: String,
        document_name: String,
        recipients: Vec<String>,
    },
    DocumentRemoved {
        account_name: String,
        document_name: String,
        recipients: Vec<String>,
    },
}
