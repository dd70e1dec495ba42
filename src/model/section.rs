//! Sections: the engine's final output.

use serde::{Deserialize, Serialize};

use super::Paragraph;

/// A titled run of paragraphs spanning one or more pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section title
    pub title: Option<String>,

    /// Paragraphs in reading order
    pub paragraphs: Vec<Paragraph>,

    /// First page of the section
    pub page_start: u32,

    /// Last page of the section
    pub page_end: u32,

    /// Whether the most recent append merged into the previous paragraph
    #[serde(skip)]
    last_append_merged: bool,
}

impl Section {
    /// Create an empty section starting on `page`.
    pub fn new(title: Option<String>, page: u32) -> Self {
        Self {
            title,
            paragraphs: Vec::new(),
            page_start: page,
            page_end: page,
            last_append_merged: false,
        }
    }

    /// Append a paragraph, merging it into the previous one when that one is
    /// unfinished.
    ///
    /// Merging never chains: a paragraph produced by a merge is not merged
    /// again even if it is still unfinished. A merged paragraph keeps the page
    /// of its first part. Returns whether a merge happened.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) -> bool {
        if paragraph.is_empty() {
            return false;
        }

        if !self.last_append_merged {
            if let Some(last) = self.paragraphs.last_mut() {
                if last.is_unfinished() {
                    last.absorb(paragraph);
                    self.last_append_merged = true;
                    return true;
                }
            }
        }

        self.page_end = self.page_end.max(paragraph.page);
        self.paragraphs.push(paragraph);
        self.last_append_merged = false;
        false
    }

    /// Remove and return the trailing paragraph.
    pub fn pop_paragraph(&mut self) -> Option<Paragraph> {
        let popped = self.paragraphs.pop();
        self.last_append_merged = false;
        self.page_end = self
            .paragraphs
            .iter()
            .map(|p| p.page)
            .max()
            .unwrap_or(self.page_start)
            .max(self.page_start);
        popped
    }

    /// Check if the section has any paragraphs.
    pub fn has_paragraphs(&self) -> bool {
        !self.paragraphs.is_empty()
    }

    /// Display text: title, then paragraphs separated by blank lines.
    pub fn display_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(title.clone());
        }
        parts.extend(self.paragraphs.iter().map(Paragraph::display_text));
        parts.join("\n\n")
    }

    /// Markdown: `## Title` heading, then LLM-ready paragraphs.
    pub fn to_markdown(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(format!("## {}", title));
        }
        parts.extend(self.paragraphs.iter().map(Paragraph::llm_text));
        parts.join("\n\n")
    }
}
