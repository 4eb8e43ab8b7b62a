use crate::application::storage_key::{StorageKeyGenerator, UniqueKeys};
use crate::application::{ObjectStore, RecordStore};
use crate::domain::{DomainError, DraftNote, NewNote, Note, NoteRecord};
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Callback invoked with the full note list after every successful refresh
pub type NotesListener = Box<dyn Fn(&[Note]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Keeps an in-memory snapshot of the user's notes in step with the record
/// store, with image URLs resolved through the object store.
///
/// Every mutation is followed by a full refresh; the list is never patched
/// locally. Operations are not serialized against each other, so when they
/// overlap the last refresh to finish decides the visible list.
pub struct NotesClient<R: RecordStore, O: ObjectStore> {
    records: R,
    objects: O,
    keys: Box<dyn StorageKeyGenerator>,
    notes: RwLock<Vec<Note>>,
    listeners: Mutex<Vec<(SubscriptionId, NotesListener)>>,
    next_subscription: AtomicU64,
}

impl<R: RecordStore, O: ObjectStore> NotesClient<R, O> {
    pub fn new(records: R, objects: O) -> Self {
        Self {
            records,
            objects,
            keys: Box::new(UniqueKeys::new()),
            notes: RwLock::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn with_key_generator(mut self, keys: impl StorageKeyGenerator + 'static) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn objects(&self) -> &O {
        &self.objects
    }

    /// Snapshot of the list produced by the last successful refresh
    pub async fn notes(&self) -> Vec<Note> {
        self.notes.read().await.clone()
    }

    pub async fn subscribe(
        &self,
        listener: impl Fn(&[Note]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().await.push((id, Box::new(listener)));
        debug!(?id, "Listener subscribed");
        id
    }

    /// Returns false if the subscription was already gone
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().await;
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Replace the in-memory list with the record store's current contents.
    ///
    /// Image URLs are resolved concurrently, one request per note with an
    /// image. A failed resolution leaves that note without `image_url`; it
    /// neither drops the note nor fails the refresh. Order follows the
    /// record store.
    #[instrument(level = "debug", skip(self))]
    pub async fn refresh(&self) -> Result<Vec<Note>, DomainError> {
        let records = self.records.list().await.map_err(sync_error)?;
        debug!(count = records.len(), "Fetched note records");

        let notes = join_all(records.into_iter().map(|record| self.resolve(record))).await;

        *self.notes.write().await = notes.clone();

        for (_, listener) in self.listeners.lock().await.iter() {
            listener(&notes);
        }

        info!(count = notes.len(), "Refreshed notes");
        Ok(notes)
    }

    async fn resolve(&self, record: NoteRecord) -> Note {
        let Some(key) = record.image_key().map(str::to_owned) else {
            return Note::from_record(record, None);
        };

        match self.objects.get_url(&key).await {
            Ok(signed) => Note::from_record(record, Some(signed.url)),
            Err(e) => {
                let error = DomainError::Resolution {
                    key,
                    reason: format!("{e:#}"),
                };
                warn!(note_id = %record.id, %error, "Showing note without image");
                Note::from_record(record, None)
            }
        }
    }

    /// Submit a draft.
    ///
    /// Returns `Ok(None)` without touching any store when the draft is
    /// missing its name or description. An attached image is uploaded first;
    /// if that fails no record is written. On success the draft is cleared,
    /// the list refreshed, and the new note's id returned.
    #[instrument(level = "debug", skip_all, fields(name = %draft.name))]
    pub async fn create(&self, draft: &mut DraftNote) -> Result<Option<String>, DomainError> {
        if let Err(e) = draft.validate() {
            debug!(error = %e, "Ignoring incomplete draft");
            return Ok(None);
        }

        let image = match &draft.image {
            Some(image) => {
                let key = self.keys.key_for(&image.file_name);
                self.objects
                    .put(&key, &image.data)
                    .await
                    .map_err(|e| DomainError::Upload {
                        key: key.clone(),
                        reason: format!("{e:#}"),
                    })?;
                debug!(%key, bytes = image.data.len(), "Uploaded image");
                Some(key)
            }
            None => None,
        };

        let record = self
            .records
            .create(NewNote {
                name: draft.name.clone(),
                description: draft.description.clone(),
                image,
            })
            .await
            .map_err(sync_error)?;
        info!(note_id = %record.id, "Created note");

        draft.clear();
        self.refresh().await?;
        Ok(Some(record.id))
    }

    /// Delete a note. On failure the note stays in the list until the next
    /// successful refresh.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove(&self, id: &str) -> Result<(), DomainError> {
        self.records.delete(id).await.map_err(sync_error)?;
        info!(note_id = id, "Deleted note");

        self.refresh().await?;
        Ok(())
    }
}

fn sync_error(e: anyhow::Error) -> DomainError {
    DomainError::Sync(format!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::storage_key::TimestampKeys;
    use crate::domain::DraftImage;
    use crate::util::testing::{record, MockObjectStore, MockRecordStore};
    use std::sync::Arc;

    fn client(
        records: MockRecordStore,
        objects: MockObjectStore,
    ) -> NotesClient<MockRecordStore, MockObjectStore> {
        NotesClient::new(records, objects).with_key_generator(TimestampKeys::with_clock(|| 1700000000000))
    }

    #[tokio::test]
    async fn given_three_notes_and_failing_second_url_when_refreshing_then_only_second_lacks_url() {
        // Arrange
        let records = MockRecordStore::builder()
            .with_record(record("1", "First", "One", Some("a.png")))
            .with_record(record("2", "Second", "Two", Some("b.png")))
            .with_record(record("3", "Third", "Three", Some("c.png")))
            .build();
        let objects = MockObjectStore::builder()
            .with_object("a.png", vec![1])
            .with_object("b.png", vec![2])
            .with_object("c.png", vec![3])
            .with_url_failure("b.png")
            .build();
        let client = client(records, objects);

        // Act
        let notes = client.refresh().await.expect("Refresh should succeed");

        // Assert
        assert_eq!(notes.len(), 3);
        assert_eq!(
            notes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
        assert!(notes[0].image_url.is_some());
        assert!(notes[1].image_url.is_none());
        assert_eq!(notes[1].image.as_deref(), Some("b.png"));
        assert!(notes[2].image_url.is_some());
    }

    #[tokio::test]
    async fn given_note_without_image_when_refreshing_then_does_not_request_url() {
        let records = MockRecordStore::builder()
            .with_record(record("1", "Plain", "Text only", None))
            .with_record(record("2", "Empty key", "Blank image", Some("")))
            .build();
        let client = client(records, MockObjectStore::builder().build());

        let notes = client.refresh().await.expect("Refresh should succeed");

        assert!(notes.iter().all(|n| n.image_url.is_none()));
        assert_eq!(client.objects().url_calls(), 0);
    }

    #[tokio::test]
    async fn given_unreachable_record_store_when_refreshing_then_returns_sync_error_and_keeps_list() {
        // Arrange
        let records = MockRecordStore::builder()
            .with_record(record("1", "First", "One", None))
            .build();
        let client = client(records, MockObjectStore::builder().build());
        client.refresh().await.expect("Initial refresh should succeed");
        client.records().set_list_failure(true);

        // Act
        let result = client.refresh().await;

        // Assert
        assert!(matches!(result, Err(DomainError::Sync(_))));
        assert_eq!(client.notes().await.len(), 1);
    }

    #[tokio::test]
    async fn given_no_mutation_when_refreshing_twice_then_lists_describe_same_records() {
        let records = MockRecordStore::builder()
            .with_record(record("1", "First", "One", Some("a.png")))
            .with_record(record("2", "Second", "Two", None))
            .build();
        let objects = MockObjectStore::builder().with_object("a.png", vec![1]).build();
        let client = client(records, objects);

        let first = client.refresh().await.unwrap();
        let second = client.refresh().await.unwrap();

        assert_eq!(first.len(), second.len());
        assert!(first.iter().zip(&second).all(|(a, b)| a.same_record(b)));
        // the mock issues a fresh URL on every call
        assert_ne!(first[0].image_url, second[0].image_url);
    }

    #[tokio::test]
    async fn given_valid_draft_when_creating_then_adds_exactly_one_matching_note() {
        // Arrange
        let records = MockRecordStore::builder()
            .with_record(record("1", "Existing", "Old", None))
            .build();
        let client = client(records, MockObjectStore::builder().build());
        client.refresh().await.unwrap();
        let mut draft = DraftNote::new("Groceries", "Milk, eggs");

        // Act
        let id = client.create(&mut draft).await.expect("Create should succeed");

        // Assert
        let id = id.expect("Valid draft should create a note");
        let notes = client.notes().await;
        assert_eq!(notes.len(), 2);
        let created = notes.iter().find(|n| n.id == id).expect("New note listed");
        assert_eq!(created.name, "Groceries");
        assert_eq!(created.description, "Milk, eggs");
        assert!(created.image.is_none());
        assert_eq!(draft, DraftNote::default());
    }

    #[tokio::test]
    async fn given_draft_with_image_when_creating_then_uploads_before_creating_record() {
        // Arrange
        let client = client(
            MockRecordStore::builder().build(),
            MockObjectStore::builder().build(),
        );
        let jpeg = vec![0xAB; 500 * 1024];
        let mut draft =
            DraftNote::new("Trip", "Paris").with_image(DraftImage::new("trip.jpg", jpeg.clone()));

        // Act
        client.create(&mut draft).await.expect("Create should succeed");

        // Assert
        let key = "1700000000000-trip.jpg";
        assert_eq!(client.objects().object(key).await, Some(jpeg));
        let created = client.records().created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "Trip");
        assert_eq!(created[0].description, "Paris");
        assert_eq!(created[0].image.as_deref(), Some(key));

        let notes = client.notes().await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].name, "Trip");
        assert!(notes[0]
            .image_url
            .as_deref()
            .is_some_and(|url| !url.is_empty()));
    }

    #[rstest::rstest]
    #[case("", "Paris")]
    #[case("Trip", "")]
    #[tokio::test]
    async fn given_incomplete_draft_when_creating_then_nothing_changes(
        #[case] name: &str,
        #[case] description: &str,
    ) {
        // Arrange
        let records = MockRecordStore::builder()
            .with_record(record("1", "Existing", "Old", None))
            .build();
        let client = client(records, MockObjectStore::builder().build());
        client.refresh().await.unwrap();
        let mut draft = DraftNote::new(name, description)
            .with_image(DraftImage::new("trip.jpg", vec![1, 2, 3]));

        // Act
        let result = client.create(&mut draft).await;

        // Assert
        assert!(matches!(result, Ok(None)));
        assert_eq!(client.records().created().await.len(), 0);
        assert_eq!(client.objects().put_calls(), 0);
        assert_eq!(client.records().list_calls(), 1);
        assert_eq!(client.notes().await.len(), 1);
        assert_eq!(draft.name, name);
    }

    #[tokio::test]
    async fn given_failing_upload_when_creating_then_returns_upload_error_without_record() {
        // Arrange
        let client = client(
            MockRecordStore::builder().build(),
            MockObjectStore::builder().with_put_failure().build(),
        );
        let mut draft =
            DraftNote::new("Trip", "Paris").with_image(DraftImage::new("trip.jpg", vec![1]));
        let before = draft.clone();

        // Act
        let result = client.create(&mut draft).await;

        // Assert
        match result {
            Err(DomainError::Upload { key, .. }) => assert_eq!(key, "1700000000000-trip.jpg"),
            other => panic!("Expected Upload error, got {other:?}"),
        }
        assert!(client.records().created().await.is_empty());
        assert_eq!(draft, before);
    }

    #[tokio::test]
    async fn given_failing_record_create_when_creating_then_keeps_draft_and_list() {
        let records = MockRecordStore::builder()
            .with_record(record("1", "Existing", "Old", None))
            .with_create_failure()
            .build();
        let client = client(records, MockObjectStore::builder().build());
        client.refresh().await.unwrap();
        let mut draft = DraftNote::new("Trip", "Paris");

        let result = client.create(&mut draft).await;

        assert!(matches!(result, Err(DomainError::Sync(_))));
        assert_eq!(draft.name, "Trip");
        assert_eq!(client.notes().await.len(), 1);
        assert_eq!(client.records().list_calls(), 1);
    }

    #[tokio::test]
    async fn given_successful_create_when_creating_then_refreshes_exactly_once() {
        let client = client(
            MockRecordStore::builder().build(),
            MockObjectStore::builder().build(),
        );
        let mut draft = DraftNote::new("Trip", "Paris");

        client.create(&mut draft).await.unwrap();

        assert_eq!(client.records().list_calls(), 1);
    }

    #[tokio::test]
    async fn given_failing_refresh_after_create_when_creating_then_keeps_record_and_returns_sync_error() {
        // Arrange
        let client = client(
            MockRecordStore::builder().with_list_failure().build(),
            MockObjectStore::builder().build(),
        );
        let mut draft = DraftNote::new("Trip", "Paris");

        // Act
        let result = client.create(&mut draft).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Sync(_))));
        assert_eq!(draft, DraftNote::default());
        assert_eq!(client.records().created().await.len(), 1);
        assert_eq!(client.records().list_calls(), 1);
        assert!(client.notes().await.is_empty());
    }

    #[tokio::test]
    async fn given_existing_note_when_removing_then_list_no_longer_contains_it() {
        // Arrange
        let records = MockRecordStore::builder()
            .with_record(record("1", "First", "One", None))
            .with_record(record("2", "Second", "Two", None))
            .build();
        let client = client(records, MockObjectStore::builder().build());
        client.refresh().await.unwrap();

        // Act
        client.remove("1").await.expect("Remove should succeed");

        // Assert
        let notes = client.notes().await;
        assert_eq!(notes.len(), 1);
        assert!(notes.iter().all(|n| n.id != "1"));
        assert_eq!(client.records().list_calls(), 2);
    }

    #[tokio::test]
    async fn given_failing_refresh_after_delete_when_removing_then_keeps_deletion_and_returns_sync_error() {
        // Arrange
        let records = MockRecordStore::builder()
            .with_record(record("1", "First", "One", None))
            .with_record(record("2", "Second", "Two", None))
            .build();
        let client = client(records, MockObjectStore::builder().build());
        client.refresh().await.unwrap();
        client.records().set_list_failure(true);

        // Act
        let result = client.remove("1").await;

        // Assert
        assert!(matches!(result, Err(DomainError::Sync(_))));
        let stored = client.records().stored().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "2");
        // the visible list stays stale until a refresh succeeds
        assert_eq!(client.notes().await.len(), 2);
        assert_eq!(client.records().list_calls(), 2);
    }

    #[tokio::test]
    async fn given_failing_delete_when_removing_then_note_stays_listed() {
        let records = MockRecordStore::builder()
            .with_record(record("1", "First", "One", None))
            .with_delete_failure()
            .build();
        let client = client(records, MockObjectStore::builder().build());
        client.refresh().await.unwrap();

        let result = client.remove("1").await;

        assert!(matches!(result, Err(DomainError::Sync(_))));
        assert_eq!(client.notes().await.len(), 1);
        assert_eq!(client.records().list_calls(), 1);
    }

    #[tokio::test]
    async fn given_subscriber_when_refreshing_then_receives_new_list() {
        // Arrange
        let records = MockRecordStore::builder()
            .with_record(record("1", "First", "One", None))
            .build();
        let client = client(records, MockObjectStore::builder().build());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        client
            .subscribe(move |notes| sink.lock().unwrap().push(notes.len()))
            .await;

        // Act
        client.refresh().await.unwrap();
        let mut draft = DraftNote::new("Trip", "Paris");
        client.create(&mut draft).await.unwrap();

        // Assert
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn given_failed_refresh_when_subscribed_then_listener_is_not_called() {
        let client = client(
            MockRecordStore::builder().with_list_failure().build(),
            MockObjectStore::builder().build(),
        );
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        client
            .subscribe(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        let _ = client.refresh().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn given_unsubscribed_listener_when_refreshing_then_it_is_not_called() {
        let client = client(
            MockRecordStore::builder().build(),
            MockObjectStore::builder().build(),
        );
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = client
            .subscribe(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert!(client.unsubscribe(id).await);
        assert!(!client.unsubscribe(id).await);
        client.refresh().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
