// src/util/testing.rs

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::env;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::application::{ObjectStore, RecordStore};
use crate::domain::{NewNote, NoteRecord, SignedUrl};

/// Shorthand for building a stored note record in tests
pub fn record(id: &str, name: &str, description: &str, image: Option<&str>) -> NoteRecord {
    NoteRecord {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        image: image.map(str::to_string),
    }
}

/// Shared in-memory record store for testing the notes client
///
/// Failures can be configured up front through the builder or toggled
/// later, e.g. to make a refresh fail after a successful create.
///
/// # Examples
///
/// ```
/// use notesync::util::testing::{record, MockRecordStore};
///
/// let mock = MockRecordStore::builder()
///     .with_record(record("1", "Trip", "Paris", None))
///     .with_delete_failure()
///     .build();
/// ```
pub struct MockRecordStore {
    records: Mutex<Vec<NoteRecord>>,
    created: Mutex<Vec<NewNote>>,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    list_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockRecordStore {
    pub fn builder() -> MockRecordStoreBuilder {
        MockRecordStoreBuilder::new()
    }

    pub fn set_list_failure(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_delete_failure(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Number of `list` calls, failed ones included
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Fields of every successful `create`, in call order
    pub async fn created(&self) -> Vec<NewNote> {
        self.created.lock().await.clone()
    }

    pub async fn stored(&self) -> Vec<NoteRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn list(&self) -> Result<Vec<NoteRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            bail!("record store unreachable");
        }
        Ok(self.records.lock().await.clone())
    }

    async fn create(&self, fields: NewNote) -> Result<NoteRecord> {
        if self.fail_create.load(Ordering::SeqCst) {
            bail!("create rejected");
        }
        let id = format!("note-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = NoteRecord {
            id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            image: fields.image.clone(),
        };
        self.records.lock().await.push(record.clone());
        self.created.lock().await.push(fields);
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            bail!("delete rejected");
        }
        let mut records = self.records.lock().await;
        let position = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| anyhow!("Note not found: {id}"))?;
        records.remove(position);
        Ok(())
    }
}

/// Builder for MockRecordStore
pub struct MockRecordStoreBuilder {
    records: Vec<NoteRecord>,
    fail_list: bool,
    fail_create: bool,
    fail_delete: bool,
}

impl MockRecordStoreBuilder {
    pub fn new() -> Self {
        Self {
            records: vec![],
            fail_list: false,
            fail_create: false,
            fail_delete: false,
        }
    }

    /// Add a record returned by list, kept in insertion order
    pub fn with_record(mut self, record: NoteRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn with_list_failure(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn with_create_failure(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn with_delete_failure(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn build(self) -> MockRecordStore {
        MockRecordStore {
            records: Mutex::new(self.records),
            created: Mutex::new(vec![]),
            fail_list: AtomicBool::new(self.fail_list),
            fail_create: AtomicBool::new(self.fail_create),
            fail_delete: AtomicBool::new(self.fail_delete),
            list_calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }
}

impl Default for MockRecordStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared in-memory object store for testing the notes client
///
/// Every `get_url` call returns a fresh URL, mimicking expiring signed URLs.
pub struct MockObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failing_urls: HashSet<String>,
    fail_put: AtomicBool,
    put_calls: AtomicUsize,
    url_calls: AtomicUsize,
}

impl MockObjectStore {
    pub fn builder() -> MockObjectStoreBuilder {
        MockObjectStoreBuilder::new()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn url_calls(&self) -> usize {
        self.url_calls.load(Ordering::SeqCst)
    }

    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            bail!("upload rejected");
        }
        self.objects
            .lock()
            .await
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_url(&self, key: &str) -> Result<SignedUrl> {
        let call = self.url_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_urls.contains(key) {
            bail!("signing failed for {key}");
        }
        if !self.objects.lock().await.contains_key(key) {
            bail!("no such object: {key}");
        }
        Ok(SignedUrl {
            url: format!("https://objects.test/{key}?v={call}"),
            expires_at: None,
        })
    }
}

/// Builder for MockObjectStore
pub struct MockObjectStoreBuilder {
    objects: HashMap<String, Vec<u8>>,
    failing_urls: HashSet<String>,
    fail_put: bool,
}

impl MockObjectStoreBuilder {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            failing_urls: HashSet::new(),
            fail_put: false,
        }
    }

    pub fn with_object(mut self, key: &str, data: Vec<u8>) -> Self {
        self.objects.insert(key.to_string(), data);
        self
    }

    /// Make get_url fail for `key` even when the object exists
    pub fn with_url_failure(mut self, key: &str) -> Self {
        self.failing_urls.insert(key.to_string());
        self
    }

    pub fn with_put_failure(mut self) -> Self {
        self.fail_put = true;
        self
    }

    pub fn build(self) -> MockObjectStore {
        MockObjectStore {
            objects: Mutex::new(self.objects),
            failing_urls: self.failing_urls,
            fail_put: AtomicBool::new(self.fail_put),
            put_calls: AtomicUsize::new(0),
            url_calls: AtomicUsize::new(0),
        }
    }
}

impl Default for MockObjectStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_test_setup() -> Result<()> {
    // Set up logging first
    setup_test_logging();

    info!("Test Setup complete");
    Ok(())
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "trace");
    }

    // Create a filter for noisy modules
    let noisy_modules = ["mio", "tokio", "runtime"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}
