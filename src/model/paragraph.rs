//! Paragraph type and continuation detection.

use serde::{Deserialize, Serialize};

/// A paragraph of output text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Lines for display, with original line breaks
    pub display_lines: Vec<String>,

    /// Lines for downstream language-model formatting (Markdown tables)
    pub llm_lines: Vec<String>,

    /// Page the paragraph starts on
    pub page: u32,

    /// Whether the paragraph is a table
    pub is_table: bool,
}

impl Paragraph {
    /// Create a prose paragraph; display and LLM views are identical.
    pub fn prose(lines: Vec<String>, page: u32) -> Self {
        Self {
            llm_lines: lines.clone(),
            display_lines: lines,
            page,
            is_table: false,
        }
    }

    /// Create a table paragraph from its plain and Markdown renderings.
    pub fn table(plain_lines: Vec<String>, markdown_lines: Vec<String>, page: u32) -> Self {
        Self {
            display_lines: plain_lines,
            llm_lines: markdown_lines,
            page,
            is_table: true,
        }
    }

    /// Display text with preserved line breaks.
    pub fn display_text(&self) -> String {
        self.display_lines.join("\n")
    }

    /// LLM-ready text.
    pub fn llm_text(&self) -> String {
        self.llm_lines.join("\n")
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.display_lines.iter().all(|l| l.trim().is_empty())
    }

    /// Check whether the paragraph visibly continues into the next one.
    ///
    /// True when the last non-blank line ends in `:`, `;` or `,`, or when
    /// brackets opened in the paragraph are left unclosed.
    pub fn is_unfinished(&self) -> bool {
        let Some(last) = self.display_lines.iter().rev().find(|l| !l.trim().is_empty()) else {
            return false;
        };
        if last.trim_end().ends_with([':', ';', ',']) {
            return true;
        }
        has_unbalanced_brackets(self.display_lines.iter().map(String::as_str))
    }

    /// Append the lines of `other` to this paragraph.
    pub fn absorb(&mut self, other: Paragraph) {
        self.display_lines.extend(other.display_lines);
        self.llm_lines.extend(other.llm_lines);
        self.is_table |= other.is_table;
    }
}

/// Check whether `()`, `[]` or `{}` are left open across the given lines.
fn has_unbalanced_brackets<'a>(lines: impl Iterator<Item = &'a str>) -> bool {
    let mut stack: Vec<char> = Vec::new();
    for line in lines {
        for c in line.chars() {
            match c {
                '(' | '[' | '{' => stack.push(c),
                ')' | ']' | '}' => {
                    let opener = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    if stack.last() == Some(&opener) {
                        stack.pop();
                    }
                }
                _ => {}
            }
        }
    }
    !stack.is_empty()
}
