use crate::application::RecordStore;
use crate::domain::{NewNote, NoteRecord};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Record store keeping one user's notes as a JSON array in a single file.
///
/// Records keep insertion order. Writes replace the file through a temporary
/// sibling and a rename, so readers never see a half-written file.
pub struct JsonRecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRecordStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<NoteRecord>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read note records from {}", self.path.display())
                })
            }
        };
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse note records in {}", self.path.display()))
    }

    async fn write_all(&self, records: &[NoteRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create record store directory")?;
        }
        let json =
            serde_json::to_string_pretty(records).context("Failed to serialize note records")?;

        let tmp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp_path, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!(?tmp_path, error = %cleanup, "Failed to remove temporary file");
            }
            return Err(e).with_context(|| format!("Failed to replace {}", self.path.display()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    #[instrument(level = "debug", skip(self))]
    async fn list(&self) -> Result<Vec<NoteRecord>> {
        self.read_all().await
    }

    #[instrument(level = "debug", skip(self), fields(name = %fields.name))]
    async fn create(&self, fields: NewNote) -> Result<NoteRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;

        let record = NoteRecord {
            id: Uuid::new_v4().to_string(),
            name: fields.name,
            description: fields.description,
            image: fields.image,
        };
        records.push(record.clone());
        self.write_all(&records).await?;

        info!(note_id = %record.id, "Stored note record");
        Ok(record)
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;

        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            debug!(note_id = id, "Note not found for deletion");
            return Err(anyhow!("Note not found: {id}"));
        }
        self.write_all(&records).await?;

        info!(note_id = id, "Removed note record");
        Ok(())
    }
}
