use crate::domain::{NewNote, NoteRecord, SignedUrl, User};
use anyhow::Result;
use async_trait::async_trait;

/// Durable storage for note records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All note records, in the store's order
    async fn list(&self) -> Result<Vec<NoteRecord>>;

    /// Persist a new note; the store assigns the id
    async fn create(&self, fields: NewNote) -> Result<NoteRecord>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// Blob storage addressed by key
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, overwriting any existing object
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Short-lived retrieval URL for `key`
    async fn get_url(&self, key: &str) -> Result<SignedUrl>;
}

/// Session management. The notes client never calls this itself; the
/// presentation layer does, and stores are scoped to the returned user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>>;

    async fn sign_out(&self) -> Result<()>;
}
