pub mod draft;
pub mod error;
pub mod note;

pub use draft::{DraftImage, DraftNote};
pub use error::DomainError;
pub use note::{NewNote, Note, NoteRecord, SignedUrl, User};
