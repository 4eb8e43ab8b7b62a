use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use uuid::Uuid;

lazy_static! {
    static ref UNSAFE_KEY_CHARS: Regex =
        Regex::new(r"[^A-Za-z0-9._-]").expect("Failed to compile key sanitizer regex");
}

/// Derives object store keys for uploaded images
pub trait StorageKeyGenerator: Send + Sync {
    fn key_for(&self, file_name: &str) -> String;
}

impl<T: StorageKeyGenerator + ?Sized> StorageKeyGenerator for Box<T> {
    fn key_for(&self, file_name: &str) -> String {
        (**self).key_for(file_name)
    }
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

fn system_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Reduce a user-supplied file name to a safe key suffix.
///
/// Only the final path component is kept and anything outside
/// `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");
    let cleaned = UNSAFE_KEY_CHARS.replace_all(base, "_").into_owned();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "image".to_string()
    } else {
        cleaned
    }
}

/// `{millis}-{file name}`. Two uploads of the same name within one
/// millisecond collide.
pub struct TimestampKeys {
    clock: Clock,
}

impl TimestampKeys {
    pub fn new() -> Self {
        Self {
            clock: Box::new(system_millis),
        }
    }

    pub fn with_clock(clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }
}

impl Default for TimestampKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageKeyGenerator for TimestampKeys {
    fn key_for(&self, file_name: &str) -> String {
        format!("{}-{}", (self.clock)(), sanitize_file_name(file_name))
    }
}

/// `{millis}-{uuid}-{file name}`
pub struct UniqueKeys {
    clock: Clock,
}

impl UniqueKeys {
    pub fn new() -> Self {
        Self {
            clock: Box::new(system_millis),
        }
    }

    pub fn with_clock(clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }
}

impl Default for UniqueKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageKeyGenerator for UniqueKeys {
    fn key_for(&self, file_name: &str) -> String {
        format!(
            "{}-{}-{}",
            (self.clock)(),
            Uuid::new_v4().simple(),
            sanitize_file_name(file_name)
        )
    }
}
