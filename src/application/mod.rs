pub mod collaborators;
pub mod notes_client;
pub mod storage_key;

pub use collaborators::{IdentityProvider, ObjectStore, RecordStore};
pub use notes_client::{NotesClient, NotesListener, SubscriptionId};
pub use storage_key::{StorageKeyGenerator, TimestampKeys, UniqueKeys};
