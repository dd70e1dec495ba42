//! Table detection from phrase alignment.
//!
//! A table starts at a header line split into several phrases by wide gaps.
//! Column boundaries fall midway between header phrases; rows start at
//! "anchor" lines whose first word lines up with the first header phrase.

use super::patterns::{dice_sides, DICE_RE};
use crate::model::{Cell, PositionedLine, TableBlock};

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Gap that separates phrases, as a multiple of the body font size
    pub phrase_gap_factor: f32,
    /// Minimum share of capitalized phrases in a header
    pub capitalized_ratio: f32,
    /// Headers recognised by capitalization have fewer phrases than this
    pub max_capitalized_phrases: usize,
    /// Lines denser than this multiple of the header density read as prose
    pub prose_density_factor: f32,
    /// Anchor alignment tolerance (fraction of font size)
    pub anchor_tolerance_factor: f32,
    /// Minimum vertical separation between anchors (fraction of font size)
    pub anchor_separation_factor: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            phrase_gap_factor: 1.0,
            capitalized_ratio: 0.6,
            max_capitalized_phrases: 5,
            prose_density_factor: 1.3,
            anchor_tolerance_factor: 1.0,
            anchor_separation_factor: 0.5,
        }
    }
}

/// Detects and parses tables within a run of lines.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    fn phrase_gap(&self, body_size: f32) -> f32 {
        body_size * self.config.phrase_gap_factor
    }

    /// Check whether a line looks like a table header.
    ///
    /// The line needs at least two phrases, and then either dice notation,
    /// mostly capitalized phrases, or a single bold face throughout.
    pub fn is_header(&self, line: &PositionedLine, body_size: f32) -> bool {
        let phrases = line.phrases(self.phrase_gap(body_size));
        if phrases.len() < 2 {
            return false;
        }

        if DICE_RE.is_match(&line.text()) {
            return true;
        }

        let capitalized = phrases
            .iter()
            .filter(|p| p.text.chars().next().is_some_and(|c| c.is_uppercase()))
            .count();
        if phrases.len() < self.config.max_capitalized_phrases
            && capitalized as f32 >= phrases.len() as f32 * self.config.capitalized_ratio
        {
            return true;
        }

        line.is_uniform_bold()
    }

    /// Number of lines, starting with the header at `lines[0]`, that belong
    /// to the table.
    ///
    /// With dice notation (`NdM`) in the header the table ends once `M`
    /// aligned rows have been seen and a prose-like line follows. Otherwise
    /// it runs until `stop` matches or the lines run out.
    pub fn delimit(
        &self,
        lines: &[&PositionedLine],
        body_size: f32,
        stop: impl Fn(&PositionedLine) -> bool,
    ) -> usize {
        let Some(header) = lines.first() else {
            return 0;
        };
        let gap = self.phrase_gap(body_size);
        let phrases = header.phrases(gap);
        let anchor_x = phrases.first().map(|p| p.x0).unwrap_or(header.bbox.x0);
        let expected_rows = dice_sides(&header.text());
        let header_density = header.density();

        let mut aligned = 0;
        for (i, &line) in lines.iter().enumerate().skip(1) {
            if stop(line) {
                return i;
            }
            if let Some(expected) = expected_rows {
                let prose_like = line.phrases(gap).len() <= 1
                    || line.density() > header_density * self.config.prose_density_factor;
                if aligned >= expected && prose_like {
                    log::trace!("Dice table ends after {} rows", aligned);
                    return i;
                }
            }
            if (line.first_word_x() - anchor_x).abs()
                <= line.font_size() * self.config.anchor_tolerance_factor
            {
                aligned += 1;
            }
        }

        lines.len()
    }

    /// Parse lines (header first) into a table.
    ///
    /// Returns `None` when the header yields fewer than two columns.
    pub fn parse<'a>(&self, lines: Vec<&'a PositionedLine>, body_size: f32) -> Option<TableBlock<'a>> {
        let header = *lines.first()?;
        let phrases = header.phrases(self.phrase_gap(body_size));
        if phrases.len() < 2 {
            return None;
        }

        let num_cols = phrases.len();
        let mut bounds = Vec::with_capacity(num_cols + 1);
        bounds.push(f32::NEG_INFINITY);
        for pair in phrases.windows(2) {
            bounds.push((pair[0].x1 + pair[1].x0) / 2.0);
        }
        bounds.push(f32::INFINITY);

        let anchor_x = phrases[0].x0;
        let mut rows: Vec<Vec<&'a PositionedLine>> = Vec::new();
        let mut anchor_tops: Vec<f32> = Vec::new();

        for &line in &lines {
            let size = line.font_size();
            let aligned = (line.first_word_x() - anchor_x).abs() <= size * self.config.anchor_tolerance_factor;
            let separated = anchor_tops
                .iter()
                .all(|top| (top - line.bbox.y1).abs() >= size * self.config.anchor_separation_factor);

            if rows.is_empty() || (aligned && separated) {
                anchor_tops.push(line.bbox.y1);
                rows.push(vec![line]);
            } else if let Some(row) = rows.last_mut() {
                row.push(line);
            }
        }

        let cells: Vec<Vec<Cell>> = rows
            .iter()
            .map(|row_lines| {
                bounds
                    .windows(2)
                    .map(|range| {
                        Cell::new(
                            row_lines
                                .iter()
                                .map(|l| l.text_between(range[0], range[1]))
                                .collect(),
                        )
                    })
                    .collect()
            })
            .collect();

        log::debug!("Parsed table: {} rows x {} columns", cells.len(), num_cols);

        Some(TableBlock {
            source_lines: lines,
            rows: cells,
            num_cols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(segments: &[(f32, &str)], y: f32) -> PositionedLine {
        PositionedLine::from_segments(segments, y, 10.0, "Helvetica")
    }

    fn prose(text: &str, y: f32) -> PositionedLine {
        PositionedLine::from_text(text, 50.0, y, 10.0, "Helvetica")
    }

    #[test]
    fn test_header_detection() {
        let detector = TableDetector::new();
        let header = row(&[(50.0, "Roll"), (150.0, "Result"), (250.0, "d6")], 600.0);
        assert!(detector.is_header(&header, 10.0));

        let dice = row(&[(50.0, "2d6"), (150.0, "encounter"), (250.0, "notes")], 600.0);
        assert!(detector.is_header(&dice, 10.0));

        let lowercase = row(&[(50.0, "one"), (150.0, "two"), (250.0, "three")], 600.0);
        assert!(!detector.is_header(&lowercase, 10.0));

        let bold = PositionedLine::from_segments(&[(50.0, "one"), (150.0, "two")], 600.0, 10.0, "Helvetica-Bold");
        assert!(detector.is_header(&bold, 10.0));

        assert!(!detector.is_header(&prose("Roll a die and Read The Result.", 600.0), 10.0));
    }

    #[test]
    fn test_parse_roll_table() {
        let header = row(&[(50.0, "Roll"), (150.0, "Result"), (250.0, "d6")], 600.0);
        let first = row(&[(50.0, "1"), (150.0, "Goblin"), (250.0, "Flee")], 589.0);
        let wrapped = row(&[(150.0, "with a spear")], 578.0);
        let second = row(&[(50.0, "2"), (150.0, "Orc"), (250.0, "Fight")], 567.0);

        let table = TableDetector::new()
            .parse(vec![&header, &first, &wrapped, &second], 10.0)
            .unwrap();

        assert_eq!(table.num_cols, 3);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[1][1].joined(), "Goblin, with a spear");
        assert_eq!(table.rows[2][2].joined(), "Fight");
        assert_eq!(table.to_markdown_lines()[2], "| 1 | Goblin, with a spear | Flee |");
    }

    #[test]
    fn test_parse_rejects_single_phrase_header() {
        let line = prose("Just a sentence.", 600.0);
        assert!(TableDetector::new().parse(vec![&line], 10.0).is_none());
    }

    #[test]
    fn test_delimit_dice_table() {
        let header = row(&[(50.0, "1d2"), (150.0, "Weather")], 600.0);
        let first = row(&[(50.0, "1"), (150.0, "Rain")], 589.0);
        let second = row(&[(50.0, "2"), (150.0, "Sun")], 578.0);
        let after = prose("The travellers press on through the valley.", 560.0);
        let lines = vec![&header, &first, &second, &after];

        assert_eq!(TableDetector::new().delimit(&lines, 10.0, |_| false), 3);
    }

    #[test]
    fn test_delimit_bare_die_size_runs_to_end() {
        let header = row(&[(50.0, "Roll"), (150.0, "Result"), (250.0, "d6")], 600.0);
        let rows: Vec<PositionedLine> = ["Goblin", "Orc", "Troll", "Ogre", "Wolf", "Bear", "Hag", "Imp"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let roll = (i + 1).to_string();
                row(&[(50.0, roll.as_str()), (150.0, *name)], 589.0 - i as f32 * 11.0)
            })
            .collect();
        let after = prose("The travellers press on through the valley.", 480.0);

        let mut lines: Vec<&PositionedLine> = vec![&header];
        lines.extend(rows.iter());
        lines.push(&after);

        assert_eq!(TableDetector::new().delimit(&lines, 10.0, |_| false), lines.len());
    }

    #[test]
    fn test_delimit_without_dice_runs_to_stop() {
        let header = row(&[(50.0, "Name"), (150.0, "Cost")], 600.0);
        let first = row(&[(50.0, "Rope"), (150.0, "1 gp")], 589.0);
        let title = PositionedLine::from_text("EQUIPMENT", 50.0, 560.0, 16.0, "Helvetica");
        let more = prose("More text.", 540.0);
        let lines = vec![&header, &first, &title, &more];

        let detector = TableDetector::new();
        assert_eq!(detector.delimit(&lines, 10.0, |l| l.font_size() > 12.0), 2);
        assert_eq!(detector.delimit(&lines, 10.0, |_| false), 4);
    }
}
