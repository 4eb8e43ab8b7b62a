use crate::domain::DomainError;
use anyhow::{Context, Result};
use std::path::Path;

/// Image picked for a draft, not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl DraftImage {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// Read an image from disk, keeping only the final path component as file name
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Invalid image file name: {}", path.display()))?
            .to_string();
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        Ok(Self { file_name, data })
    }
}

/// User input between entry and submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftNote {
    pub name: String,
    pub description: String,
    pub image: Option<DraftImage>,
}

impl DraftNote {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: DraftImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }
        if self.description.is_empty() {
            return Err(DomainError::Validation(
                "description is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
