//! Data model for section extraction.
//!
//! Input types (`PageLayout`, `PositionedLine`, `Glyph`, shapes) come from the
//! content-stream decoder. `PageModel`, `Zone`, `Column` and `Block` exist only
//! while a document is being analyzed and borrow the input lines. `Section` and
//! `Paragraph` own their text and are the final output.

mod block;
mod geometry;
mod line;
mod page;
mod paragraph;
mod section;
mod table;

pub use block::{Block, BoxedNoteBlock, InnerBlock, ProseBlock, TitleBlock};
pub use geometry::BBox;
pub use line::{Glyph, Phrase, PositionedLine};
pub use page::{
    Column, ImageRegion, PageLayout, PageModel, PageTitle, PageType, RectShape, Zone,
};
pub use paragraph::Paragraph;
pub use section::Section;
pub use table::{Cell, TableBlock};
