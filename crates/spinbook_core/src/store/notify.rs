//! Notification surface for newly added catalog elements.

use tracing::info;

/// Fire-and-forget "new element added" alert sink.
///
/// Implementations must not block; the sync engine calls this from its delta
/// loop.
pub trait Notifier: Send + Sync {
    fn new_element(&self, name: &str, id: &str, notification_id: u32);
}

/// Notifier that records alerts in the log stream.
///
/// Headless deployments use this as the default surface; interactive
/// frontends supply their own implementation.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn new_element(&self, name: &str, id: &str, notification_id: u32) {
        info!(
            target: "spinbook_core::notify",
            element = id,
            notification_id,
            "new element added: \"{}\"",
            name
        );
    }
}
