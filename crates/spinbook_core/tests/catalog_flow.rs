//! End-to-end pipeline tests over the local stores.

use spinbook_core::catalog::{Catalog, ElementUpdate, MediaSource, NewElement};
use spinbook_core::models::level::LevelFilter;
use spinbook_core::models::user::{FolderKind, FolderSets};
use spinbook_core::store::{CatalogStore, LocalStore, Notifier, ProfileStore};
use spinbook_core::store::{FsMediaStore, MediaStore};
use spinbook_core::CatalogError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn new_element(&self, _name: &str, id: &str, _notification_id: u32) {
        self.alerts.lock().expect("alerts lock").push(id.to_string());
    }
}

struct Fixture {
    catalog: Catalog,
    store: Arc<LocalStore>,
    media_root: TempDir,
    _data_dir: TempDir,
}

fn setup() -> Fixture {
    let data_dir = TempDir::new().expect("data dir");
    let media_root = TempDir::new().expect("media root");
    let store = Arc::new(LocalStore::open(data_dir.path()).expect("local store"));
    let media = Arc::new(FsMediaStore::new(media_root.path()).expect("media store"));
    let catalog = Catalog::new(
        store.clone(),
        media,
        store.clone(),
        Arc::new(RecordingNotifier::default()),
        Duration::from_secs(30),
    );
    Fixture {
        catalog,
        store,
        media_root,
        _data_dir: data_dir,
    }
}

fn new_element(name: &str, level: &str) -> NewElement {
    NewElement {
        name: name.to_string(),
        description: format!("{} description", name),
        level: level.to_string(),
        level_number: "1".to_string(),
        image: None,
        video: None,
    }
}

fn media_file_exists(root: &TempDir, url: &str) -> bool {
    let rel = url.strip_prefix("media://").expect("managed url");
    root.path().join(rel).exists()
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

#[tokio::test]
async fn create_uploads_media_and_writes_the_record() {
    let fx = setup();

    let mut request = new_element("Outside Leg Hang", "Intermediate");
    request.image = Some(MediaSource::Upload {
        file_name: "hang.jpg".to_string(),
        bytes: b"jpeg".to_vec(),
    });
    let id = fx
        .catalog
        .create_element(request)
        .await
        .expect("create element");
    assert_eq!(id, "outside_leg_hang");

    let stored = CatalogStore::fetch(&*fx.store, &id)
        .await
        .expect("fetch")
        .expect("record written");
    assert!(stored.image.starts_with("media://element_images/"));
    assert!(stored.video.is_empty());
    assert!(media_file_exists(&fx.media_root, &stored.image));

    // The mutation refreshed the mirror.
    let mirror = fx.catalog.elements().borrow().clone();
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0].id, id);
    assert_eq!(*fx.catalog.loading().borrow(), false);
}

#[tokio::test]
async fn duplicate_derived_id_is_rejected_without_writing() {
    let fx = setup();

    fx.catalog
        .create_element(new_element("Ayesha", "Advanced"))
        .await
        .expect("first create");
    let err = fx
        .catalog
        .create_element(new_element("ayesha", "Advanced"))
        .await
        .expect_err("same derived id must be rejected");
    assert!(matches!(err, CatalogError::Duplicate(ref id) if id == "ayesha"));

    let all = fx.store.fetch_all().await.expect("fetch_all");
    assert_eq!(all.len(), 1, "no second record may be written");
    assert!(
        fx.catalog.last_error().borrow().is_some(),
        "error slot must carry the failure"
    );
}

#[tokio::test]
async fn added_delta_flows_into_mirror_and_filtered_view() {
    let fx = setup();
    fx.catalog
        .create_element(new_element("Ayesha", "Advanced"))
        .await
        .expect("create");
    fx.catalog.subscribe().await.expect("subscribe");

    let elements = fx.catalog.elements();
    wait_until({
        let elements = elements.clone();
        move || elements.borrow().len() == 1
    })
    .await;

    // A record added behind the catalog's back arrives via the stream.
    fx.store
        .insert(&spinbook_core::models::Element {
            id: "butterfly".to_string(),
            name: "Butterfly".to_string(),
            level: "Beginner".to_string(),
            level_number: "2".to_string(),
            description: String::new(),
            image: String::new(),
            video: String::new(),
        })
        .await
        .expect("insert");

    wait_until({
        let elements = elements.clone();
        move || elements.borrow().len() == 2
    })
    .await;
    let names: Vec<String> = elements.borrow().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, ["Ayesha", "Butterfly"]);

    fx.catalog
        .update_filters("", LevelFilter::parse("Beginner"));
    let filtered = fx.catalog.filtered().borrow().clone();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, "butterfly");
}

#[tokio::test]
async fn update_replaces_media_and_refreshes_the_detail_view() {
    let fx = setup();

    let mut request = new_element("Brass Monkey", "Advanced");
    request.image = Some(MediaSource::Upload {
        file_name: "v1.jpg".to_string(),
        bytes: b"v1".to_vec(),
    });
    let id = fx.catalog.create_element(request).await.expect("create");
    let before = CatalogStore::fetch(&*fx.store, &id)
        .await
        .expect("fetch")
        .expect("record exists");

    fx.catalog
        .update_element(ElementUpdate {
            id: id.clone(),
            name: "Brass Monkey".to_string(),
            description: "Knee hook behind the pole.".to_string(),
            level: "Advanced".to_string(),
            level_number: "4".to_string(),
            new_image: Some(MediaSource::Upload {
                file_name: "v2.jpg".to_string(),
                bytes: b"v2".to_vec(),
            }),
            current_image: before.image.clone(),
            new_video: None,
            current_video: String::new(),
        })
        .await
        .expect("update");

    let after = CatalogStore::fetch(&*fx.store, &id)
        .await
        .expect("fetch")
        .expect("record exists");
    assert_ne!(after.image, before.image);
    assert!(media_file_exists(&fx.media_root, &after.image));
    assert!(
        !media_file_exists(&fx.media_root, &before.image),
        "replaced media is cleaned up"
    );
    assert_eq!(after.description, "Knee hook behind the pole.");

    let selected = fx.catalog.selected().borrow().clone();
    assert_eq!(selected.map(|e| e.id), Some(id));
}

#[tokio::test]
async fn update_survives_missing_previous_media() {
    let fx = setup();
    let id = fx
        .catalog
        .create_element(new_element("Chopper", "Beginner"))
        .await
        .expect("create");

    // Simulate an old URL whose object is already gone.
    fx.catalog
        .update_element(ElementUpdate {
            id: id.clone(),
            name: "Chopper".to_string(),
            description: String::new(),
            level: "Beginner".to_string(),
            level_number: "1".to_string(),
            new_image: Some(MediaSource::Upload {
                file_name: "new.jpg".to_string(),
                bytes: b"new".to_vec(),
            }),
            current_image: "media://element_images/long-gone.jpg".to_string(),
            new_video: None,
            current_video: String::new(),
        })
        .await
        .expect("missing old media must not fail the update");
}

#[tokio::test]
async fn delete_cleans_mirror_views_selection_and_media() {
    let fx = setup();

    let mut request = new_element("Fireman Spin", "Spins");
    request.video = Some(MediaSource::Upload {
        file_name: "spin.mp4".to_string(),
        bytes: b"mp4".to_vec(),
    });
    let id = fx.catalog.create_element(request).await.expect("create");
    let stored = CatalogStore::fetch(&*fx.store, &id)
        .await
        .expect("fetch")
        .expect("record exists");

    fx.catalog.fetch_element(&id).await.expect("fetch element");
    assert!(fx.catalog.selected().borrow().is_some());

    // Folder data referencing the element, to prove views drop it.
    let mut sets = FolderSets::default();
    sets.favorites.insert(id.clone());
    fx.catalog.update_folder_sets(Some(sets));
    fx.catalog
        .select_folder(Some((FolderKind::Favorites, LevelFilter::All)));
    assert_eq!(fx.catalog.folder_view().borrow().len(), 1);

    let mut deletions = fx.catalog.deletion_events();
    fx.catalog.delete_element(&id).await.expect("delete");

    assert!(CatalogStore::fetch(&*fx.store, &id)
        .await
        .expect("fetch")
        .is_none());
    assert!(fx.catalog.elements().borrow().is_empty());
    assert!(fx.catalog.filtered().borrow().is_empty());
    assert!(fx.catalog.folder_view().borrow().is_empty());
    assert!(fx.catalog.selected().borrow().is_none());
    assert!(!media_file_exists(&fx.media_root, &stored.video));
    assert_eq!(deletions.recv().await.expect("deletion event"), id);
}

#[tokio::test]
async fn delete_of_missing_element_fails_and_deletes_nothing() {
    let fx = setup();
    let err = fx
        .catalog
        .delete_element("ghost")
        .await
        .expect_err("missing record must fail");
    assert!(matches!(err, CatalogError::NotFound));
}

#[tokio::test]
async fn folder_toggle_round_trip_through_the_profile_store() {
    let fx = setup();
    let id = fx
        .catalog
        .create_element(new_element("Ayesha", "Advanced"))
        .await
        .expect("create");

    // Toggling before folder data loads is an error, not a panic.
    let err = fx
        .catalog
        .toggle_folder("uid-1", FolderKind::Wishlist, &id)
        .await
        .expect_err("folder data not loaded");
    assert!(matches!(err, CatalogError::BadRequest(_)));

    let profile = fx.store.ensure("uid-1", "marta").await.expect("ensure");
    fx.catalog.update_folder_sets(Some(profile.folders));

    let now_in = fx
        .catalog
        .toggle_folder("uid-1", FolderKind::Wishlist, &id)
        .await
        .expect("toggle on");
    assert!(now_in);
    assert!(fx.catalog.element_folder_status(&id).wishlist);
    let stored = ProfileStore::fetch(&*fx.store, "uid-1")
        .await
        .expect("fetch profile")
        .expect("profile exists");
    assert!(stored.folders.wishlist.contains(&id));

    let resolved = fx
        .catalog
        .folder_elements(FolderKind::Wishlist, &LevelFilter::All);
    assert_eq!(resolved.len(), 1);

    let now_in = fx
        .catalog
        .toggle_folder("uid-1", FolderKind::Wishlist, &id)
        .await
        .expect("toggle off");
    assert!(!now_in);
    assert!(!fx.catalog.element_folder_status(&id).wishlist);
}

#[tokio::test]
async fn upload_failure_aborts_create_before_any_write() {
    struct FailingMedia;

    #[async_trait::async_trait]
    impl MediaStore for FailingMedia {
        async fn upload(
            &self,
            _kind: spinbook_core::store::MediaKind,
            _file_name: &str,
            _bytes: &[u8],
        ) -> Result<String, CatalogError> {
            Err(CatalogError::Media("upload quota exceeded".to_string()))
        }

        async fn delete(&self, _url: &str) -> Result<bool, CatalogError> {
            Ok(true)
        }
    }

    let data_dir = TempDir::new().expect("data dir");
    let store = Arc::new(LocalStore::open(data_dir.path()).expect("local store"));
    let catalog = Catalog::new(
        store.clone(),
        Arc::new(FailingMedia),
        store.clone(),
        Arc::new(RecordingNotifier::default()),
        Duration::from_secs(30),
    );

    let mut request = new_element("Ayesha", "Advanced");
    request.image = Some(MediaSource::Upload {
        file_name: "a.jpg".to_string(),
        bytes: b"a".to_vec(),
    });
    let err = catalog
        .create_element(request)
        .await
        .expect_err("upload failure aborts");
    assert!(matches!(err, CatalogError::Media(_)));
    assert!(
        store.fetch_all().await.expect("fetch_all").is_empty(),
        "no partial record may be written"
    );
}
