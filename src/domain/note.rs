use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NoteRecord {
    /// Storage key of the attached image, ignoring empty keys
    pub fn image_key(&self) -> Option<&str> {
        self.image.as_deref().filter(|key| !key.is_empty())
    }
}

/// Fields submitted to the record store when creating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNote {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

/// A note as held by the client, with its image URL resolved at list time.
///
/// `image_url` is transient: it is never written back to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Note {
    pub fn from_record(record: NoteRecord, image_url: Option<String>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            image: record.image,
            image_url,
        }
    }

    /// True when both notes describe the same record, ignoring resolved URLs
    pub fn same_record(&self, other: &Note) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.image == other.image
    }
}

/// Retrieval URL handed out by the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub signed_in_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> &str {
        &self.username
    }
}
