//! Text normalization utilities.

pub mod cleaner;
pub mod encoding;
pub mod entities;

pub use cleaner::clean;
pub use encoding::decode_text_bytes;
pub use entities::unescape_html;
