use crate::application::ObjectStore;
use crate::constants::MAX_URL_TTL_SECS;
use crate::domain::SignedUrl;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};
use url::Url;

/// Object store backed by a directory, one file per key.
///
/// Retrieval URLs are `file://` URLs carrying an expiry and a SHA-256
/// signature over the secret, the key and the expiry.
pub struct FileObjectStore {
    root: PathBuf,
    ttl: Duration,
    secret: String,
}

impl FileObjectStore {
    pub fn new(root: impl AsRef<Path>, ttl_secs: u64, secret: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ttl: Duration::seconds(ttl_secs.min(MAX_URL_TTL_SECS) as i64),
            secret: secret.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn sign(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(key.as_bytes());
        hasher.update(b"|");
        hasher.update(expires.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Check that `url` was issued by this store and has not expired at `now`.
    /// Returns the object key on success.
    pub fn verify_url(&self, url: &str, now: DateTime<Utc>) -> Result<String> {
        let url = Url::parse(url).context("Invalid object URL")?;
        let path = url
            .to_file_path()
            .map_err(|_| anyhow!("Not a file URL: {url}"))?;
        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .context("Object URL has no key")?
            .to_string();

        let mut expires = None;
        let mut signature = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "expires" => expires = Some(value.parse::<i64>().context("Invalid expiry")?),
                "signature" => signature = Some(value.into_owned()),
                _ => {}
            }
        }
        let expires = expires.context("Object URL has no expiry")?;
        let signature = signature.context("Object URL has no signature")?;

        if signature != self.sign(&key, expires) {
            bail!("Signature mismatch for '{key}'");
        }
        if now.timestamp() > expires {
            bail!("URL for '{key}' expired");
        }
        Ok(key)
    }
}

/// Keys are flat file names; anything that could escape the root is rejected
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(|c: char| c == '/' || c == '\\') {
        bail!("Invalid object key: '{key}'");
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    #[instrument(level = "debug", skip(self, data), fields(bytes = data.len()))]
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.object_path(key)?;
        fs::create_dir_all(&self.root)
            .await
            .context("Failed to create object directory")?;
        fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write object {}", path.display()))?;
        debug!(?path, "Stored object");
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_url(&self, key: &str) -> Result<SignedUrl> {
        let path = self.object_path(key)?;
        let path = fs::canonicalize(&path)
            .await
            .with_context(|| format!("No such object: {key}"))?;

        let expires_at = Utc::now() + self.ttl;
        let expires = expires_at.timestamp();

        let mut url = Url::from_file_path(&path)
            .map_err(|_| anyhow!("Cannot build URL for {}", path.display()))?;
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &self.sign(key, expires));

        Ok(SignedUrl {
            url: url.into(),
            expires_at: Some(expires_at),
        })
    }
}
