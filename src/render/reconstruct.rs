//! Section reconstruction.
//!
//! Analyzed pages are flattened into a stream of events in reading order
//! (pages, then zones, columns and blocks) and folded into sections. The
//! fold state is passed by value through each step so individual
//! transitions can be tested on their own.

use crate::model::{
    Block, BoxedNoteBlock, InnerBlock, PageModel, PageType, Paragraph, PositionedLine, ProseBlock,
    Section, TableBlock,
};
use crate::parser::ExtractOptions;

/// Title used when a section starts before any title was seen.
pub const UNTITLED_SECTION: &str = "Untitled Section";

/// Line gap, as a multiple of the body size, that starts a new paragraph.
const PARAGRAPH_GAP_RATIO: f32 = 1.2;

/// First continuation suffix for a repeated title.
const FIRST_CONTINUATION: u32 = 2;

/// One step of the flattened document.
#[derive(Debug, Clone, Copy)]
enum Event<'m, 'a> {
    /// Start of a page
    Page { page_type: PageType },
    /// Title detected at the top of a content page
    PageTitle { page_id: u32, text: &'m str },
    /// A column block
    Block {
        page_id: u32,
        body_size: f32,
        block: &'m Block<'a>,
    },
}

fn flatten<'m, 'a>(pages: &'m [PageModel<'a>]) -> Vec<Event<'m, 'a>> {
    let mut events = Vec::new();
    for page in pages {
        events.push(Event::Page {
            page_type: page.page_type,
        });
        if let Some(title) = &page.title {
            events.push(Event::PageTitle {
                page_id: page.page_id,
                text: &title.text,
            });
        }
        for zone in &page.zones {
            for column in &zone.columns {
                for block in &column.blocks {
                    events.push(Event::Block {
                        page_id: page.page_id,
                        body_size: page.body_font_size,
                        block,
                    });
                }
            }
        }
    }
    events
}

/// Build sections from analyzed pages in document order.
pub fn reconstruct(pages: &[PageModel<'_>], options: &ExtractOptions) -> Vec<Section> {
    let sections = flatten(pages)
        .into_iter()
        .fold(Reconstructor::new(options.keep_style), Reconstructor::step)
        .finish();

    log::info!("Reconstructed {} sections from {} pages", sections.len(), pages.len());
    sections
}

/// Fold state for section reconstruction.
#[derive(Debug, Clone)]
struct Reconstructor {
    sections: Vec<Section>,
    current: Option<Section>,
    last_title: Option<String>,
    counter: u32,
    keep_style: bool,
}

impl Reconstructor {
    fn new(keep_style: bool) -> Self {
        Self {
            sections: Vec::new(),
            current: None,
            last_title: None,
            counter: FIRST_CONTINUATION,
            keep_style,
        }
    }

    fn step(self, event: Event<'_, '_>) -> Self {
        match event {
            Event::Page { page_type } if page_type != PageType::Content => {
                let mut state = self.finalize();
                state.last_title = Some(page_type.placeholder_title());
                state.counter = FIRST_CONTINUATION;
                state
            }
            Event::Page { .. } => self,
            Event::PageTitle { page_id, text } => self.open_titled(text.to_string(), page_id),
            Event::Block {
                page_id,
                body_size,
                block,
            } => match block {
                Block::Title(title) => self.open_titled(title.text.clone(), page_id),
                Block::Prose(prose) => {
                    let paragraphs = prose_paragraphs(prose, page_id, body_size, self.keep_style);
                    paragraphs.into_iter().fold(self, Self::add_paragraph)
                }
                Block::Table(table) => self.add_paragraph(table_paragraph(table, page_id)),
                Block::BoxedNote(note) => self.boxed_note(note, page_id, body_size),
            },
        }
    }

    /// Push the active section (if it has paragraphs) and clear it.
    fn finalize(mut self) -> Self {
        if let Some(section) = self.current.take() {
            if section.has_paragraphs() {
                self.sections.push(section);
            }
        }
        self
    }

    fn finish(self) -> Vec<Section> {
        self.finalize().sections
    }

    /// Start a new section under an explicit title.
    fn open_titled(self, title: String, page: u32) -> Self {
        let mut state = self.finalize();
        state.current = Some(Section::new(Some(title.clone()), page));
        state.last_title = Some(title);
        state.counter = FIRST_CONTINUATION;
        state
    }

    /// Title for a section that starts without one: the last title with a
    /// Roman numeral suffix.
    fn synthesized_title(&mut self) -> String {
        match &self.last_title {
            Some(title) => {
                let synthesized = format!("{} ({})", title, to_roman(self.counter));
                self.counter += 1;
                synthesized
            }
            None => UNTITLED_SECTION.to_string(),
        }
    }

    fn add_paragraph(mut self, paragraph: Paragraph) -> Self {
        if paragraph.is_empty() {
            return self;
        }
        if self.current.is_none() {
            let title = self.synthesized_title();
            self.current = Some(Section::new(Some(title), paragraph.page));
        }
        if let Some(section) = self.current.as_mut() {
            section.add_paragraph(paragraph);
        }
        self
    }

    /// Emit a boxed note as its own section.
    ///
    /// The active section's trailing paragraph is held back while the box is
    /// emitted and then reopens a continuation section.
    fn boxed_note(mut self, note: &BoxedNoteBlock<'_>, page: u32, body_size: f32) -> Self {
        let held = self.current.as_mut().and_then(Section::pop_paragraph);
        let mut state = self.finalize();

        let mut note_section = Section::new(Some(note.title_text.clone()), page);
        let mut inner = Reconstructor::new(state.keep_style);
        inner.last_title = Some(note.title_text.clone());
        let mut opened_subsection = false;

        for block in &note.internal_blocks {
            let paragraphs = match block {
                InnerBlock::Title(title) => {
                    inner = inner.open_titled(title.text.clone(), page);
                    opened_subsection = true;
                    continue;
                }
                InnerBlock::Prose(prose) => prose_paragraphs(prose, page, body_size, state.keep_style),
                InnerBlock::Table(table) => vec![table_paragraph(table, page)],
            };
            for paragraph in paragraphs {
                if opened_subsection {
                    inner = inner.add_paragraph(paragraph);
                } else {
                    note_section.add_paragraph(paragraph);
                }
            }
        }

        state.sections.push(note_section);
        state.sections.extend(inner.finish());

        if let Some(paragraph) = held {
            let title = state.synthesized_title();
            let mut section = Section::new(Some(title), paragraph.page);
            section.add_paragraph(paragraph);
            state.current = Some(section);
        }

        state
    }
}

/// Split a prose block into paragraphs where the blank space between two
/// consecutive lines is large.
fn prose_paragraphs(prose: &ProseBlock<'_>, page: u32, body_size: f32, keep_style: bool) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut prev: Option<&PositionedLine> = None;

    for &line in &prose.source_lines {
        if let Some(prev) = prev {
            if prev.bbox.vertical_gap(&line.bbox) > body_size * PARAGRAPH_GAP_RATIO && !lines.is_empty() {
                paragraphs.push(Paragraph::prose(std::mem::take(&mut lines), page));
            }
        }
        prev = Some(line);

        let text = if keep_style {
            line.styled_text()
        } else {
            line.text()
        };
        if !text.is_empty() {
            lines.push(text);
        }
    }

    if !lines.is_empty() {
        paragraphs.push(Paragraph::prose(lines, page));
    }
    paragraphs
}

fn table_paragraph(table: &TableBlock<'_>, page: u32) -> Paragraph {
    Paragraph::table(table.to_plain_lines(), table.to_markdown_lines(), page)
}

/// Convert a number to upper-case Roman numerals.
pub fn to_roman(mut num: u32) -> String {
    let numerals = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut result = String::new();
    for (value, symbol) in numerals {
        while num >= value {
            result.push_str(symbol);
            num -= value;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Cell, Column, PageTitle, TitleBlock, Zone};

    fn line(text: &str, y: f32) -> PositionedLine {
        PositionedLine::from_text(text, 72.0, y, 10.0, "Times-Roman")
    }

    fn prose<'a>(lines: &[&'a PositionedLine]) -> Block<'a> {
        Block::Prose(ProseBlock {
            source_lines: lines.to_vec(),
        })
    }

    fn title<'a>(text: &str) -> Block<'a> {
        Block::Title(TitleBlock {
            text: text.to_string(),
            source_lines: Vec::new(),
        })
    }

    fn page<'a>(page_id: u32, blocks: Vec<Block<'a>>) -> PageModel<'a> {
        let bbox = BBox::new(0.0, 0.0, 612.0, 792.0);
        let mut column = Column::new(bbox);
        column.blocks = blocks;
        PageModel {
            page_id,
            page_type: PageType::Content,
            body_font_size: 10.0,
            title: None,
            zones: vec![Zone {
                bbox,
                columns: vec![column],
            }],
            rects: Vec::new(),
        }
    }

    fn titles(sections: &[Section]) -> Vec<&str> {
        sections.iter().map(|s| s.title.as_deref().unwrap_or("")).collect()
    }

    fn run(pages: &[PageModel]) -> Vec<Section> {
        reconstruct(pages, &ExtractOptions::default())
    }

    #[test]
    fn test_to_roman() {
        assert_eq!(to_roman(2), "II");
        assert_eq!(to_roman(4), "IV");
        assert_eq!(to_roman(14), "XIV");
        assert_eq!(to_roman(1999), "MCMXCIX");
    }

    #[test]
    fn test_untitled_section() {
        let a = line("Some opening text.", 700.0);
        let sections = run(&[page(1, vec![prose(&[&a])])]);
        assert_eq!(titles(&sections), vec![UNTITLED_SECTION]);
        assert_eq!(sections[0].paragraphs[0].display_text(), "Some opening text.");
    }

    #[test]
    fn test_prose_splits_on_large_gaps() {
        let a = line("First paragraph line one", 700.0);
        let b = line("and line two.", 689.0);
        let c = line("Second paragraph.", 660.0);
        let sections = run(&[page(1, vec![prose(&[&a, &b, &c])])]);
        assert_eq!(sections[0].paragraphs.len(), 2);
        assert_eq!(
            sections[0].paragraphs[0].display_text(),
            "First paragraph line one\nand line two."
        );
    }

    #[test]
    fn test_loose_leading_stays_one_paragraph() {
        // 10pt text on a 14pt pitch leaves 4pt between lines
        let lines: Vec<PositionedLine> = (0..6)
            .map(|i| line("A line of loosely leaded text", 700.0 - i as f32 * 14.0))
            .collect();
        let refs: Vec<&PositionedLine> = lines.iter().collect();
        let sections = run(&[page(1, vec![prose(&refs)])]);
        assert_eq!(sections[0].paragraphs.len(), 1);
        assert_eq!(sections[0].paragraphs[0].display_lines.len(), 6);

        // A 30pt pitch leaves 20pt of blank space and starts a new paragraph
        let a = line("Closing words.", 600.0);
        let b = line("Opening words.", 570.0);
        let sections = run(&[page(1, vec![prose(&[&a, &b])])]);
        assert_eq!(sections[0].paragraphs.len(), 2);
    }

    #[test]
    fn test_title_starts_section() {
        let a = line("Intro text.", 700.0);
        let b = line("Rules text.", 600.0);
        let sections = run(&[page(1, vec![title("Intro"), prose(&[&a]), title("Rules"), prose(&[&b])])]);
        assert_eq!(titles(&sections), vec!["Intro", "Rules"]);
    }

    #[test]
    fn test_title_without_paragraphs_is_dropped() {
        let a = line("Rules text.", 600.0);
        let sections = run(&[page(1, vec![title("Empty"), title("Rules"), prose(&[&a])])]);
        assert_eq!(titles(&sections), vec!["Rules"]);
    }

    #[test]
    fn test_page_title() {
        let a = line("Body.", 600.0);
        let mut model = page(1, vec![prose(&[&a])]);
        model.title = Some(PageTitle {
            text: "THE SUNKEN KEEP".to_string(),
            lines: Vec::new(),
        });
        let sections = run(&[model]);
        assert_eq!(titles(&sections), vec!["THE SUNKEN KEEP"]);
    }

    #[test]
    fn test_non_content_page_placeholder() {
        let a = line("Intro text.", 700.0);
        let b = line("After the credits.", 700.0);
        let sections = run(&[
            page(1, vec![title("Intro"), prose(&[&a])]),
            PageModel::empty(2, PageType::Credits),
            page(3, vec![prose(&[&b])]),
        ]);
        assert_eq!(titles(&sections), vec!["Intro", "(Credits Page) (II)"]);
        assert_eq!(sections[1].page_start, 3);
    }

    #[test]
    fn test_section_spans_pages() {
        let a = line("Intro text.", 700.0);
        let b = line("More intro.", 700.0);
        let sections = run(&[page(1, vec![title("Intro"), prose(&[&a])]), page(2, vec![prose(&[&b])])]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].page_start, 1);
        assert_eq!(sections[0].page_end, 2);
    }

    #[test]
    fn test_table_paragraph() {
        let table = TableBlock {
            source_lines: Vec::new(),
            rows: vec![
                vec![Cell::text("Roll"), Cell::text("Result")],
                vec![Cell::text("1"), Cell::text("Goblin")],
            ],
            num_cols: 2,
        };
        let sections = run(&[page(1, vec![title("Encounters"), Block::Table(table)])]);
        let paragraph = &sections[0].paragraphs[0];
        assert!(paragraph.is_table);
        assert_eq!(paragraph.display_lines[0], "Roll  Result");
        assert_eq!(paragraph.llm_lines[0], "| Roll | Result |");
    }

    #[test]
    fn test_boxed_note_holds_back_trailing_paragraph() {
        let a = line("Intro paragraph.", 700.0);
        let b = line("The guards say:", 660.0);
        let inside = line("Halt! Who goes there?", 600.0);
        let after = line("They wait for an answer.", 500.0);
        let note = Block::BoxedNote(BoxedNoteBlock {
            title_text: "Guard Captain".to_string(),
            title_lines: Vec::new(),
            internal_blocks: vec![InnerBlock::Prose(ProseBlock {
                source_lines: vec![&inside],
            })],
            source_lines: vec![&inside],
        });

        let sections = run(&[page(1, vec![title("Intro"), prose(&[&a, &b]), note, prose(&[&after])])]);

        assert_eq!(titles(&sections), vec!["Intro", "Guard Captain", "Intro (II)"]);
        assert_eq!(sections[0].paragraphs.len(), 1);
        assert_eq!(sections[1].paragraphs[0].display_text(), "Halt! Who goes there?");
        // The held-back paragraph ends in ':' and absorbs the next one
        assert_eq!(
            sections[2].paragraphs[0].display_text(),
            "The guards say:\nThey wait for an answer."
        );
    }

    #[test]
    fn test_boxed_note_without_held_paragraph() {
        let inside = line("Box text.", 600.0);
        let after = line("After the box.", 500.0);
        let note = Block::BoxedNote(BoxedNoteBlock {
            title_text: "Note".to_string(),
            title_lines: Vec::new(),
            internal_blocks: vec![InnerBlock::Title(TitleBlock {
                text: "Details".to_string(),
                source_lines: Vec::new(),
            }), InnerBlock::Prose(ProseBlock {
                source_lines: vec![&inside],
            })],
            source_lines: vec![&inside],
        });

        let sections = run(&[page(1, vec![title("Chapter"), note, prose(&[&after])])]);
        assert_eq!(titles(&sections), vec!["Note", "Details", "Chapter (II)"]);
        assert!(!sections[0].has_paragraphs());
    }

    #[test]
    fn test_keep_style() {
        let mut bold = line("Warning: traps ahead.", 700.0);
        for glyph in bold.glyphs.iter_mut().take(8) {
            glyph.bold = true;
        }
        let pages = [page(1, vec![prose(&[&bold])])];

        let plain = reconstruct(&pages, &ExtractOptions::default());
        assert_eq!(plain[0].paragraphs[0].display_text(), "Warning: traps ahead.");

        let styled = reconstruct(&pages, &ExtractOptions::default().with_keep_style(true));
        assert_eq!(styled[0].paragraphs[0].display_text(), "**Warning:** traps ahead.");
    }

    #[test]
    fn test_empty_input() {
        assert!(run(&[]).is_empty());
        assert!(run(&[PageModel::empty(1, PageType::Cover)]).is_empty());
    }
}
