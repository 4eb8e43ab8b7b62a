use crate::application::IdentityProvider;
use crate::constants::{SESSION_FILE_NAME, USERS_DIR_NAME};
use crate::domain::{DomainError, User};
use crate::infrastructure::file_store::validate_key;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Identity provider keeping the signed-in user in a session file
pub struct LocalIdentity {
    data_dir: PathBuf,
}

impl LocalIdentity {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE_NAME)
    }

    /// Directory holding the notes and objects of `user`
    pub fn user_dir(&self, user: &User) -> PathBuf {
        self.data_dir.join(USERS_DIR_NAME).join(&user.username)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn sign_in(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() || validate_key(username).is_err() {
            return Err(DomainError::Validation(format!("invalid username '{username}'")).into());
        }

        let user = User {
            username: username.to_string(),
            signed_in_at: Utc::now(),
        };
        fs::create_dir_all(&self.data_dir)
            .await
            .context("Failed to create data directory")?;
        let json = serde_json::to_string_pretty(&user).context("Failed to serialize session")?;
        fs::write(self.session_path(), json)
            .await
            .context("Failed to write session file")?;

        info!(username = %user.username, "Signed in");
        Ok(user)
    }

    /// The signed-in user, or `DomainError::NotSignedIn`
    pub async fn require_user(&self) -> Result<User> {
        self.current_user()
            .await?
            .ok_or_else(|| DomainError::NotSignedIn.into())
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn current_user(&self) -> Result<Option<User>> {
        let content = match fs::read_to_string(self.session_path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read session file"),
        };
        let user = serde_json::from_str(&content).context("Failed to parse session file")?;
        Ok(Some(user))
    }

    #[instrument(level = "debug", skip(self))]
    async fn sign_out(&self) -> Result<()> {
        match fs::remove_file(self.session_path()).await {
            Ok(()) => info!("Signed out"),
            Err(e) if e.kind() == ErrorKind::NotFound => debug!("No session to sign out of"),
            Err(e) => return Err(e).context("Failed to remove session file"),
        }
        Ok(())
    }
}
