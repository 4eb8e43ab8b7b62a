pub mod config;
pub mod file_store;
pub mod json_store;
pub mod renderer;
pub mod session;

pub use config::Config;
pub use file_store::FileObjectStore;
pub use json_store::JsonRecordStore;
pub use renderer::ContentRenderer;
pub use session::LocalIdentity;
