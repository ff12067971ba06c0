// Debounced auto-save timer
// At most one pending timer, owned by the document it was scheduled for

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::app::AppEvent;
use crate::models::DocumentId;

struct Pending {
    id: DocumentId,
    generation: u64,
    cancel: CancellationToken,
}

/// Cancellable debounce timer that posts `AppEvent::AutoSaveDue` when it fires.
///
/// Every `schedule` cancels the previous timer first. The generation number in
/// the fired event lets the app drop a message from a timer that was replaced
/// after it had already been queued.
pub struct AutoSaveTimer {
    events: UnboundedSender<AppEvent>,
    pending: Option<Pending>,
    generation: u64,
}

impl AutoSaveTimer {
    pub fn new(events: UnboundedSender<AppEvent>) -> Self {
        Self {
            events,
            pending: None,
            generation: 0,
        }
    }

    /// Replace any pending timer with one that fires for `id` after `delay`
    pub fn schedule(&mut self, id: DocumentId, delay: Duration) {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = events.send(AppEvent::AutoSaveDue { id, generation });
                }
            }
        });

        tracing::trace!(%id, generation, ?delay, "auto-save scheduled");
        self.pending = Some(Pending { id, generation, cancel });
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
            tracing::trace!(id = %pending.id, "auto-save cancelled");
        }
    }

    /// Cancel only if the pending timer belongs to `id`
    pub fn cancel_for(&mut self, id: DocumentId) {
        if self.pending_for() == Some(id) {
            self.cancel();
        }
    }

    pub fn pending_for(&self) -> Option<DocumentId> {
        self.pending.as_ref().map(|p| p.id)
    }

    /// Accept a fired timer. False when the timer was cancelled or superseded.
    pub fn take_fired(&mut self, id: DocumentId, generation: u64) -> bool {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.id == id && p.generation == generation);
        if current {
            self.pending = None;
        }
        current
    }
}

impl Drop for AutoSaveTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
