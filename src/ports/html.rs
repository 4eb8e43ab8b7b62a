use crate::domain::Note;
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::instrument;

/// Renders the notes page: greeting, then one card per note
#[derive(Debug, Default)]
pub struct HtmlPresenter;

impl HtmlPresenter {
    pub fn new() -> Self {
        Self
    }

    fn render_note(&self, note: &Note) -> String {
        let image = match &note.image_url {
            Some(url) => format!(
                r#"
        <img src="{src}" alt="{alt}" width="200">"#,
                src = encode_double_quoted_attribute(url),
                alt = encode_double_quoted_attribute(&note.name),
            ),
            None => String::new(),
        };

        format!(
            r#"    <div class="note" id="note-{id_attr}">
        <div class="note-name">{name}</div>
        <div class="note-description">{description}</div>{image}
        <div class="note-id">{id}</div>
    </div>
"#,
            id_attr = encode_double_quoted_attribute(&note.id),
            id = encode_text(&note.id),
            name = encode_text(&note.name),
            description = encode_text(&note.description),
            image = image,
        )
    }

    #[instrument(level = "debug", skip_all, fields(count = notes.len()))]
    pub fn render(&self, display_name: &str, notes: &[Note]) -> String {
        let body = if notes.is_empty() {
            r#"    <p class="empty">No notes yet</p>
"#
            .to_string()
        } else {
            notes.iter().map(|note| self.render_note(note)).collect()
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Notes</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 2rem auto;
            padding: 0 1rem;
        }}
        .note {{
            border: 1px solid #ddd;
            border-radius: 8px;
            padding: 1rem;
            margin-bottom: 1rem;
        }}
        .note-name {{
            font-weight: bold;
        }}
        .note-id {{
            margin-top: 0.5rem;
            font-size: 0.8em;
            color: #666;
        }}
    </style>
</head>
<body>
    <h3>Hello, {user}</h3>
{body}</body>
</html>"#,
            user = encode_text(display_name),
            body = body,
        )
    }
}
