//! Catalog sync engine: mirror ownership, delta loop, notifications.
//!
//! The engine keeps a local, always-sorted mirror of the catalog store and
//! is its single writer. A subscription is one dedicated task receiving
//! ordered delta batches over a channel and applying them sequentially;
//! stream errors fail open (the last-known-good mirror is kept). The
//! explicit [`SyncEngine::refresh`] path coexists with the listener for
//! pull-to-refresh flows.

mod gate;
mod projector;

pub use projector::Projector;

use crate::error::CatalogError;
use crate::models::element::Element;
use crate::store::{CatalogStore, ChangeKind, ChangeStream, ElementChange, Notifier, StreamEvent};
use gate::NotificationGate;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;

/// Apply one delta batch to the mirror and restore name order.
///
/// Added inserts unless the id is already present; Modified replaces by id
/// (or inserts, keeping the mirror consistent with the store); Removed
/// deletes by id. The mirror never holds two entries with the same id.
pub(crate) fn apply_batch(mirror: &mut Vec<Element>, batch: &[ElementChange]) {
    for change in batch {
        match change.kind {
            ChangeKind::Added => {
                if !mirror.iter().any(|e| e.id == change.element.id) {
                    mirror.push(change.element.clone());
                }
            }
            ChangeKind::Modified => {
                if let Some(existing) = mirror.iter_mut().find(|e| e.id == change.element.id) {
                    *existing = change.element.clone();
                } else {
                    mirror.push(change.element.clone());
                }
            }
            ChangeKind::Removed => {
                mirror.retain(|e| e.id != change.element.id);
            }
        }
    }
    mirror.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Maintains the catalog mirror and announces newly added elements.
pub struct SyncEngine {
    store: Arc<dyn CatalogStore>,
    notifier: Arc<dyn Notifier>,
    projector: Arc<Projector>,
    elements_tx: Arc<watch::Sender<Vec<Element>>>,
    error_tx: Arc<watch::Sender<Option<String>>>,
    gate: Arc<Mutex<NotificationGate>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    /// Build an engine over `store`, publishing errors to the shared
    /// `error_tx` slot.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        notifier: Arc<dyn Notifier>,
        projector: Arc<Projector>,
        error_tx: Arc<watch::Sender<Option<String>>>,
        cooldown: Duration,
    ) -> Self {
        let (elements_tx, _) = watch::channel(Vec::new());
        Self {
            store,
            notifier,
            projector,
            elements_tx: Arc::new(elements_tx),
            error_tx,
            gate: Arc::new(Mutex::new(NotificationGate::new(cooldown))),
            task: tokio::sync::Mutex::new(None),
        }
    }

    /// Observable catalog mirror (name ascending).
    pub fn elements(&self) -> watch::Receiver<Vec<Element>> {
        self.elements_tx.subscribe()
    }

    /// Snapshot of the current mirror.
    pub fn current(&self) -> Vec<Element> {
        self.elements_tx.borrow().clone()
    }

    /// The projector deriving filtered/folder views from this mirror.
    pub fn projector(&self) -> &Arc<Projector> {
        &self.projector
    }

    /// Establish the single active subscription to the store's change
    /// stream. A call while a subscription is live is a no-op.
    ///
    /// # Errors
    /// Returns an error when the store refuses the subscription; the mirror
    /// is left untouched.
    pub async fn subscribe(&self) -> Result<(), CatalogError> {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                return Ok(());
            }
        }

        let stream = self.store.subscribe().await?;
        let elements_tx = self.elements_tx.clone();
        let error_tx = self.error_tx.clone();
        let projector = self.projector.clone();
        let notifier = self.notifier.clone();
        let gate = self.gate.clone();
        *task = Some(tokio::spawn(run_delta_loop(
            stream,
            elements_tx,
            error_tx,
            projector,
            notifier,
            gate,
        )));
        Ok(())
    }

    /// Release the active subscription, if any. The mirror keeps its last
    /// state for display until a new subscription repopulates it.
    pub async fn unsubscribe(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }

    /// One-shot fetch replacing the whole mirror, bypassing the stream.
    ///
    /// # Errors
    /// Returns the store failure; the previous mirror is kept.
    pub async fn refresh(&self) -> Result<(), CatalogError> {
        let mut elements = self.store.fetch_all().await?;
        elements.sort_by(|a, b| a.name.cmp(&b.name));
        self.elements_tx.send_replace(elements);
        self.projector.recompute(&self.elements_tx.borrow());
        Ok(())
    }
}

fn lock_gate(gate: &Mutex<NotificationGate>) -> std::sync::MutexGuard<'_, NotificationGate> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_delta_loop(
    mut stream: ChangeStream,
    elements_tx: Arc<watch::Sender<Vec<Element>>>,
    error_tx: Arc<watch::Sender<Option<String>>>,
    projector: Arc<Projector>,
    notifier: Arc<dyn Notifier>,
    gate: Arc<Mutex<NotificationGate>>,
) {
    // Cold start: the first non-empty batch is the snapshot; its records are
    // marked notified without a visible alert.
    let mut seeded = false;
    while let Some(event) = stream.recv().await {
        match event {
            StreamEvent::Batch(batch) => {
                if batch.is_empty() {
                    continue;
                }
                elements_tx.send_modify(|mirror| apply_batch(mirror, &batch));

                let mut gate = lock_gate(&gate);
                if !seeded {
                    for change in &batch {
                        gate.mark_notified(&change.element.id);
                    }
                    seeded = true;
                } else {
                    let now = Instant::now();
                    for change in batch.iter().filter(|c| c.kind == ChangeKind::Added) {
                        if gate.admit(&change.element.id, now) {
                            let alert_id = gate.next_alert_id();
                            notifier.new_element(
                                &change.element.name,
                                &change.element.id,
                                alert_id,
                            );
                        }
                    }
                }
                drop(gate);

                projector.recompute(&elements_tx.borrow());
            }
            StreamEvent::Error(message) => {
                error!(target: "spinbook_core::sync", "catalog stream error: {}", message);
                error_tx.send_replace(Some(message));
            }
        }
    }
}

#[cfg(test)]
mod tests;
