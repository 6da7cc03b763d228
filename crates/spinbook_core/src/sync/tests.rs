//! Engine loop tests driven by a scripted store.

use super::*;
use crate::models::element::ElementPatch;
use crate::store::{CatalogStore, ElementChange, StreamEvent};
use crate::test_support::sample_element;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Store whose change stream is driven by the test.
#[derive(Default)]
struct ScriptedStore {
    elements: Mutex<Vec<Element>>,
    stream_tx: Mutex<Option<mpsc::Sender<StreamEvent>>>,
    subscriptions: AtomicUsize,
}

impl ScriptedStore {
    fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    async fn push(&self, event: StreamEvent) -> Result<(), ()> {
        let tx = self
            .stream_tx
            .lock()
            .expect("stream sender lock")
            .clone()
            .expect("no active subscription");
        tx.send(event).await.map_err(|_| ())
    }
}

#[async_trait]
impl CatalogStore for ScriptedStore {
    async fn fetch_all(&self) -> Result<Vec<Element>, CatalogError> {
        let mut elements = self.elements.lock().expect("elements lock").clone();
        elements.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(elements)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Element>, CatalogError> {
        Ok(self
            .elements
            .lock()
            .expect("elements lock")
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn exists(&self, id: &str) -> Result<bool, CatalogError> {
        Ok(self.fetch(id).await?.is_some())
    }

    async fn insert(&self, element: &Element) -> Result<(), CatalogError> {
        self.elements
            .lock()
            .expect("elements lock")
            .push(element.clone());
        Ok(())
    }

    async fn patch(&self, _id: &str, _patch: &ElementPatch) -> Result<(), CatalogError> {
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), CatalogError> {
        self.elements
            .lock()
            .expect("elements lock")
            .retain(|e| e.id != id);
        Ok(())
    }

    async fn subscribe(&self) -> Result<ChangeStream, CatalogError> {
        let (tx, rx) = mpsc::channel(8);
        *self.stream_tx.lock().expect("stream sender lock") = Some(tx);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<(String, String, u32)>>,
}

impl RecordingNotifier {
    fn alert_count(&self) -> usize {
        self.alerts.lock().expect("alerts lock").len()
    }
}

impl Notifier for RecordingNotifier {
    fn new_element(&self, name: &str, id: &str, notification_id: u32) {
        self.alerts
            .lock()
            .expect("alerts lock")
            .push((name.to_string(), id.to_string(), notification_id));
    }
}

struct Harness {
    store: Arc<ScriptedStore>,
    notifier: Arc<RecordingNotifier>,
    engine: Arc<SyncEngine>,
}

fn harness(cooldown: Duration) -> Harness {
    let store = Arc::new(ScriptedStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let projector = Arc::new(Projector::new());
    let (error_tx, _) = watch::channel(None);
    let engine = Arc::new(SyncEngine::new(
        store.clone(),
        notifier.clone(),
        projector,
        Arc::new(error_tx),
        cooldown,
    ));
    Harness {
        store,
        notifier,
        engine,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn added_batch(elements: &[Element]) -> StreamEvent {
    StreamEvent::Batch(elements.iter().cloned().map(ElementChange::added).collect())
}

#[tokio::test]
async fn second_subscribe_while_active_is_a_no_op() {
    let h = harness(Duration::from_secs(30));
    h.engine.subscribe().await.expect("subscribe");
    h.engine.subscribe().await.expect("second subscribe");
    assert_eq!(h.store.subscription_count(), 1);

    // Exactly one loop applies the batch; no doubled mirror entries.
    h.store
        .push(added_batch(&[sample_element("ayesha", "Ayesha", "Advanced")]))
        .await
        .expect("push");
    let engine = h.engine.clone();
    wait_until(move || engine.current().len() == 1).await;
    assert_eq!(h.engine.current().len(), 1);
}

#[tokio::test]
async fn deltas_keep_the_mirror_unique_and_name_sorted() {
    let h = harness(Duration::from_secs(30));
    h.engine.subscribe().await.expect("subscribe");

    // Initial snapshot.
    h.store
        .push(added_batch(&[sample_element("ayesha", "Ayesha", "Advanced")]))
        .await
        .expect("push");

    // Re-add of a known id, one genuinely new record, one replacement.
    let mut renamed = sample_element("ayesha", "Ayesha (twisted grip)", "Advanced");
    renamed.description = "Twisted grip variant.".to_string();
    h.store
        .push(StreamEvent::Batch(vec![
            ElementChange::added(sample_element("ayesha", "Ayesha", "Advanced")),
            ElementChange::added(sample_element("butterfly", "Butterfly", "Beginner")),
            ElementChange::modified(renamed),
        ]))
        .await
        .expect("push");

    let engine = h.engine.clone();
    wait_until(move || {
        let mirror = engine.current();
        mirror.len() == 2 && mirror[0].id == "ayesha"
    })
    .await;

    let mirror = h.engine.current();
    assert_eq!(mirror.len(), 2);
    assert_eq!(mirror[0].name, "Ayesha (twisted grip)");
    assert_eq!(mirror[1].name, "Butterfly");

    h.store
        .push(StreamEvent::Batch(vec![ElementChange::removed(
            sample_element("ayesha", "Ayesha (twisted grip)", "Advanced"),
        )]))
        .await
        .expect("push");
    let engine = h.engine.clone();
    wait_until(move || engine.current().len() == 1).await;
    assert_eq!(h.engine.current()[0].id, "butterfly");
}

#[tokio::test]
async fn added_delta_projects_through_the_level_filter() {
    let h = harness(Duration::from_secs(30));
    let filtered = h.engine.projector().filtered();
    h.engine
        .projector()
        .set_filter(
            crate::filter::FilterState::new("", crate::models::level::LevelFilter::parse("Beginner")),
            &h.engine.current(),
        );
    h.engine.subscribe().await.expect("subscribe");

    h.store
        .push(added_batch(&[sample_element("a", "Ayesha", "Advanced")]))
        .await
        .expect("push");
    h.store
        .push(added_batch(&[sample_element("b", "Butterfly", "Beginner")]))
        .await
        .expect("push");

    let engine = h.engine.clone();
    wait_until(move || engine.current().len() == 2).await;

    let mirror = h.engine.current();
    assert_eq!(mirror[0].name, "Ayesha");
    assert_eq!(mirror[1].name, "Butterfly");

    let projected = filtered.borrow().clone();
    assert_eq!(projected.len(), 1);
    assert_eq!(projected[0].id, "b");
}

#[tokio::test]
async fn stream_error_fails_open_and_keeps_the_mirror() {
    let store = Arc::new(ScriptedStore::default());
    let (error_tx, error_rx) = watch::channel(None);
    let engine = Arc::new(SyncEngine::new(
        store.clone(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(Projector::new()),
        Arc::new(error_tx),
        Duration::from_secs(30),
    ));

    engine.subscribe().await.expect("subscribe");
    store
        .push(added_batch(&[sample_element("ayesha", "Ayesha", "Advanced")]))
        .await
        .expect("push");
    let engine_wait = engine.clone();
    wait_until(move || engine_wait.current().len() == 1).await;

    store
        .push(StreamEvent::Error("stream dropped".to_string()))
        .await
        .expect("push error");
    let mut error_wait = error_rx.clone();
    wait_until(move || error_wait.borrow_and_update().is_some()).await;

    assert_eq!(engine.current().len(), 1, "mirror must survive the error");
    assert_eq!(error_rx.borrow().as_deref(), Some("stream dropped"));
}

#[tokio::test]
async fn burst_of_adds_alerts_once_and_marks_all_notified() {
    let h = harness(Duration::from_secs(30));
    h.engine.subscribe().await.expect("subscribe");

    // Cold-start snapshot: never announced.
    h.store
        .push(added_batch(&[sample_element("ayesha", "Ayesha", "Advanced")]))
        .await
        .expect("push");
    let engine = h.engine.clone();
    wait_until(move || engine.current().len() == 1).await;
    assert_eq!(h.notifier.alert_count(), 0);

    let burst = [
        sample_element("b1", "Brass Monkey", "Intermediate"),
        sample_element("b2", "Butterfly", "Beginner"),
        sample_element("b3", "Bow and Arrow", "Advanced"),
    ];
    h.store.push(added_batch(&burst)).await.expect("push");
    let engine = h.engine.clone();
    wait_until(move || engine.current().len() == 4).await;
    assert_eq!(h.notifier.alert_count(), 1, "cooldown admits one alert");

    // All three lost their one chance; replaying them alerts nothing.
    h.store.push(added_batch(&burst)).await.expect("push");
    let notifier = h.notifier.clone();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(notifier.alert_count(), 1);
}

#[tokio::test]
async fn unsubscribe_releases_the_stream_and_keeps_the_mirror() {
    let h = harness(Duration::from_secs(30));
    h.engine.subscribe().await.expect("subscribe");
    h.store
        .push(added_batch(&[sample_element("ayesha", "Ayesha", "Advanced")]))
        .await
        .expect("push");
    let engine = h.engine.clone();
    wait_until(move || engine.current().len() == 1).await;

    h.engine.unsubscribe().await;
    h.engine.unsubscribe().await; // safe to repeat

    let store = h.store.clone();
    wait_until(move || {
        // The loop is gone once the channel reports closed.
        store
            .stream_tx
            .lock()
            .expect("stream sender lock")
            .as_ref()
            .map(|tx| tx.is_closed())
            .unwrap_or(true)
    })
    .await;
    assert_eq!(h.engine.current().len(), 1, "mirror persists for display");

    // Resubscription opens a second stream.
    h.engine.subscribe().await.expect("resubscribe");
    assert_eq!(h.store.subscription_count(), 2);
}

#[tokio::test]
async fn refresh_replaces_the_mirror_from_a_one_shot_fetch() {
    let h = harness(Duration::from_secs(30));
    h.store
        .insert(&sample_element("chopper", "Chopper", "Beginner"))
        .await
        .expect("insert");
    h.store
        .insert(&sample_element("attitude", "Attitude", "Spins"))
        .await
        .expect("insert");

    h.engine.refresh().await.expect("refresh");
    let mirror = h.engine.current();
    let names: Vec<&str> = mirror.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Attitude", "Chopper"]);
}
