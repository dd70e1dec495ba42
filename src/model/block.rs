//! Typed content blocks produced by column segmentation.

use super::{PositionedLine, TableBlock};

/// A run of lines recognised as a heading.
#[derive(Debug, Clone)]
pub struct TitleBlock<'a> {
    /// Heading text
    pub text: String,
    /// Lines the heading was built from
    pub source_lines: Vec<&'a PositionedLine>,
}

impl<'a> TitleBlock<'a> {
    /// Build a title from its lines.
    pub fn from_lines(source_lines: Vec<&'a PositionedLine>) -> Self {
        let text = source_lines
            .iter()
            .map(|l| l.text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text, source_lines }
    }
}

/// Ordinary running text.
#[derive(Debug, Clone)]
pub struct ProseBlock<'a> {
    /// Lines of the block, top to bottom
    pub source_lines: Vec<&'a PositionedLine>,
}

/// A framed sidebar with its own title and content.
#[derive(Debug, Clone)]
pub struct BoxedNoteBlock<'a> {
    /// Title text ("Note" when the box has no title lines)
    pub title_text: String,
    /// Lines that formed the title
    pub title_lines: Vec<&'a PositionedLine>,
    /// Content of the box
    pub internal_blocks: Vec<InnerBlock<'a>>,
    /// Every line inside the box
    pub source_lines: Vec<&'a PositionedLine>,
}

/// A block that may appear inside a boxed note.
#[derive(Debug, Clone)]
pub enum InnerBlock<'a> {
    /// Heading
    Title(TitleBlock<'a>),
    /// Running text
    Prose(ProseBlock<'a>),
    /// Parsed table
    Table(TableBlock<'a>),
}

/// A segmented block within a column.
#[derive(Debug, Clone)]
pub enum Block<'a> {
    /// Heading
    Title(TitleBlock<'a>),
    /// Running text
    Prose(ProseBlock<'a>),
    /// Parsed table
    Table(TableBlock<'a>),
    /// Framed sidebar
    BoxedNote(BoxedNoteBlock<'a>),
}

impl<'a> Block<'a> {
    /// Lines covered by the block.
    pub fn source_lines(&self) -> &[&'a PositionedLine] {
        match self {
            Block::Title(t) => &t.source_lines,
            Block::Prose(p) => &p.source_lines,
            Block::Table(t) => &t.source_lines,
            Block::BoxedNote(b) => &b.source_lines,
        }
    }

    /// Check if this block is a title.
    pub fn is_title(&self) -> bool {
        matches!(self, Block::Title(_))
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    /// Check if this block is a boxed note.
    pub fn is_boxed_note(&self) -> bool {
        matches!(self, Block::BoxedNote(_))
    }
}

impl<'a> From<InnerBlock<'a>> for Block<'a> {
    fn from(inner: InnerBlock<'a>) -> Self {
        match inner {
            InnerBlock::Title(t) => Block::Title(t),
            InnerBlock::Prose(p) => Block::Prose(p),
            InnerBlock::Table(t) => Block::Table(t),
        }
    }
}

impl<'a> InnerBlock<'a> {
    /// Lines covered by the block.
    pub fn source_lines(&self) -> &[&'a PositionedLine] {
        match self {
            InnerBlock::Title(t) => &t.source_lines,
            InnerBlock::Prose(p) => &p.source_lines,
            InnerBlock::Table(t) => &t.source_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_lines() {
        let a = PositionedLine::from_text("THE DARK", 0.0, 100.0, 14.0, "Helvetica");
        let b = PositionedLine::from_text("FOREST", 0.0, 84.0, 14.0, "Helvetica");
        let title = TitleBlock::from_lines(vec![&a, &b]);
        assert_eq!(title.text, "THE DARK FOREST");
        assert_eq!(title.source_lines.len(), 2);
    }

    #[test]
    fn test_inner_block_conversion() {
        let a = PositionedLine::from_text("text", 0.0, 100.0, 10.0, "Helvetica");
        let inner = InnerBlock::Prose(ProseBlock { source_lines: vec![&a] });
        let block: Block = inner.into();
        assert!(!block.is_title());
        assert_eq!(block.source_lines().len(), 1);
    }
}
