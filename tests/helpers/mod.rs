use anyhow::{Context, Result};
use notesync::infrastructure::{Config, LocalIdentity};
use notesync::LocalNotesClient;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temporary data directory with a signed-in user
#[allow(dead_code)]
pub struct TestWorkspace {
    temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub config: Config,
    pub identity: LocalIdentity,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create an empty workspace with `username` signed in
    pub async fn signed_in(username: &str) -> Result<Self> {
        let workspace = Self::signed_out()?;
        workspace.identity.sign_in(username).await?;
        Ok(workspace)
    }

    pub fn signed_out() -> Result<Self> {
        let temp_dir = tempfile::tempdir().context("Failed to create temporary directory")?;
        let data_dir = temp_dir.path().join("data");

        let mut config = Config::default();
        config.storage.data_dir = data_dir.to_string_lossy().into_owned();
        config.urls.signing_secret = "test-secret".to_string();

        let identity = LocalIdentity::new(&data_dir);
        Ok(Self {
            temp_dir,
            data_dir,
            config,
            identity,
        })
    }

    pub async fn open_client(&self) -> Result<LocalNotesClient> {
        let (_, client) = notesync::open_client(&self.config, &self.identity).await?;
        Ok(client)
    }

    /// Write a fake image file and return its path
    pub fn image_file(&self, name: &str, size: usize) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, vec![0xD8; size]).context("Failed to write image fixture")?;
        Ok(path)
    }
}
