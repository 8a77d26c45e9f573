pub mod language;
pub mod text;

pub use language::{Language, UnknownLanguage};
pub use text::{HeadingLevel, Page, Paragraph, TextData, TextError};
