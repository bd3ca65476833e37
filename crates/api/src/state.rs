use runtime::{Session, SessionEvent, StatusSnapshot};
use tokio::sync::{broadcast, watch};

/// Read-only handles onto a running session. Handlers never touch the session
/// itself; they read the last published snapshot.
#[derive(Clone, Debug)]
pub struct AppState {
    status: watch::Receiver<StatusSnapshot>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl AppState {
    pub fn new(
        status: watch::Receiver<StatusSnapshot>,
        events_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self { status, events_tx }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::new(session.subscribe_status(), session.event_sender())
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }
}
