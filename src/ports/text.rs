use crate::domain::Note;
use anyhow::{Context, Result};

/// Terminal rendering of the note list
#[derive(Debug, Default)]
pub struct TextPresenter;

impl TextPresenter {
    pub fn new() -> Self {
        Self
    }

    /// One block per note: `id  name`, indented description, then the image URL if any
    pub fn render(&self, notes: &[Note]) -> String {
        if notes.is_empty() {
            return "No notes\n".to_string();
        }
        let mut out = String::new();
        for note in notes {
            out.push_str(&format!("{}\t{}\n", note.id, note.name));
            out.push_str(&format!("    {}\n", note.description));
            if let Some(url) = &note.image_url {
                out.push_str(&format!("    image: {url}\n"));
            }
        }
        out
    }

    pub fn render_json(&self, notes: &[Note]) -> Result<String> {
        serde_json::to_string_pretty(notes).context("Failed to serialize notes to JSON")
    }
}
