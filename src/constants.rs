// src/constants.rs
//
// Application-wide names and defaults shared by the local backend and the CLI.

/// Directory name under the platform config and data directories.
pub const APP_DIR_NAME: &str = "notesync";

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Session file written by sign-in, relative to the data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Per-user data lives under `<data dir>/users/<username>/`.
pub const USERS_DIR_NAME: &str = "users";

/// Record store file inside a user's directory.
pub const NOTES_FILE_NAME: &str = "notes.json";

/// Object store directory inside a user's directory.
pub const OBJECTS_DIR_NAME: &str = "objects";

/// Lifetime of a signed image URL when the config does not set one.
///
/// Used in: `infrastructure/config.rs`, `infrastructure/file_store.rs`
pub const DEFAULT_URL_TTL_SECS: u64 = 900;

/// Upper bound for the configured URL lifetime (seven days).
///
/// Used in: `infrastructure/file_store.rs`
pub const MAX_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Delay in milliseconds after opening the notes page before returning.
///
/// The temp directory holding the page is removed when the renderer is
/// dropped; the browser needs a moment to read the file first.
///
/// Used in: `infrastructure/renderer.rs`
pub const BROWSER_LAUNCH_DELAY_MS: u64 = 500;
