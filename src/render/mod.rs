//! Section reconstruction and output rendering.

mod json;
mod markdown;
mod reconstruct;
mod text;

pub use json::{to_json, JsonFormat};
pub use markdown::to_markdown;
pub use reconstruct::{reconstruct, to_roman, UNTITLED_SECTION};
pub use text::to_text;
