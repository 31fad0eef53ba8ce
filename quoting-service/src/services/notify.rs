//! Domain event notification port.

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Receives lifecycle events. Delivery is best-effort; implementations must
/// not fail the triggering operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn quote_modified(&self, quote_id: Uuid);
}

/// Logs events through `tracing`.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn quote_modified(&self, quote_id: Uuid) {
        info!(quote_id = %quote_id, event = "quote.modified", "Quote modified");
    }
}

/// Collects events for test assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Uuid>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modified_quotes(&self) -> Vec<Uuid> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn quote_modified(&self, quote_id: Uuid) {
        if let Ok(mut events) = self.events.lock() {
            events.push(quote_id);
        }
    }
}
