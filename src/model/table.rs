//! Table types and their text renderings.

use super::PositionedLine;

/// A table cell holding one text fragment per source line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    /// Text of the cell, one entry per line it spans
    pub text_lines: Vec<String>,
}

impl Cell {
    /// Create a cell from its line fragments, dropping empty ones.
    pub fn new(text_lines: Vec<String>) -> Self {
        Self {
            text_lines: text_lines
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Create a single-line cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    /// Cell content on one line: fragments joined with `", "`, with
    /// words hyphenated across a line break rejoined.
    pub fn joined(&self) -> String {
        let mut result = String::new();
        for fragment in &self.text_lines {
            if result.is_empty() {
                result.push_str(fragment);
            } else if ends_with_wrap_hyphen(&result)
                && fragment.chars().next().is_some_and(|c| c.is_lowercase())
            {
                result.pop();
                result.push_str(fragment);
            } else {
                result.push_str(", ");
                result.push_str(fragment);
            }
        }
        result
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.text_lines.is_empty()
    }
}

fn ends_with_wrap_hyphen(text: &str) -> bool {
    let mut chars = text.chars().rev();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_alphabetic())
}

/// A table parsed from a header line and the rows beneath it.
#[derive(Debug, Clone)]
pub struct TableBlock<'a> {
    /// Lines the table was parsed from
    pub source_lines: Vec<&'a PositionedLine>,
    /// Rows of cells; the first row is the header
    pub rows: Vec<Vec<Cell>>,
    /// Number of columns
    pub num_cols: usize,
}

impl<'a> TableBlock<'a> {
    /// Get the number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn joined_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                (0..self.num_cols)
                    .map(|i| row.get(i).map(Cell::joined).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// Render as a Markdown pipe table, one string per line.
    pub fn to_markdown_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.num_cols == 0 {
            return lines;
        }

        for (i, row) in self.joined_rows().iter().enumerate() {
            let mut line = String::from("|");
            for cell in row {
                line.push_str(&format!(" {} |", cell.replace('|', "\\|")));
            }
            lines.push(line);

            if i == 0 {
                lines.push(format!("|{}", " --- |".repeat(self.num_cols)));
            }
        }

        lines
    }

    /// Render as fixed-width plain text, one string per line.
    pub fn to_plain_lines(&self) -> Vec<String> {
        let rows = self.joined_rows();
        let mut widths = vec![0usize; self.num_cols];
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut lines = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ");
            lines.push(line.trim_end().to_string());

            if i == 0 {
                let rule = widths
                    .iter()
                    .map(|w| "-".repeat((*w).max(1)))
                    .collect::<Vec<_>>()
                    .join("  ");
                lines.push(rule);
            }
        }

        lines
    }
}
