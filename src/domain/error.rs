use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid draft: {0}")]
    Validation(String),
    #[error("Record store error: {0}")]
    Sync(String),
    #[error("Upload of '{key}' failed: {reason}")]
    Upload { key: String, reason: String },
    #[error("Could not resolve URL for '{key}': {reason}")]
    Resolution { key: String, reason: String },
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Configuration error: {0}")]
    Config(String),
}
