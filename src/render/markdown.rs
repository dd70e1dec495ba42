//! Markdown rendering for extracted sections.

use crate::model::Section;

/// Convert sections to Markdown.
///
/// Each section becomes a `## Title` heading followed by its paragraphs in
/// their LLM-ready form, so tables render as pipe tables.
pub fn to_markdown(sections: &[Section]) -> String {
    sections
        .iter()
        .map(Section::to_markdown)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
