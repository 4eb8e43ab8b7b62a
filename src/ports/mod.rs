pub mod html;
pub mod text;

pub use html::HtmlPresenter;
pub use text::TextPresenter;
