//! Font size statistics.

use std::collections::HashMap;

use crate::model::PositionedLine;

/// Body size used when no glyph sizes are available.
pub const DEFAULT_BODY_SIZE: f32 = 12.0;

/// Smallest glyph size considered body text.
const MIN_BODY_SIZE: f32 = 6.0;

/// Largest glyph size considered body text.
const MAX_BODY_SIZE: f32 = 30.0;

/// Glyph size histogram for body size detection.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    /// All observed font sizes with frequency, keyed at 0.1pt precision
    pub size_histogram: HashMap<i32, usize>,
    total: f64,
    count: usize,
}

impl FontStatistics {
    /// Collect glyph sizes from lines.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a PositionedLine>) -> Self {
        let mut stats = Self::default();
        for line in lines {
            stats.add_line(line);
        }
        stats
    }

    /// Add every visible glyph of a line.
    pub fn add_line(&mut self, line: &PositionedLine) {
        for glyph in line.glyphs.iter().filter(|g| !g.is_space()) {
            self.add_size(glyph.size);
        }
    }

    /// Add a font size observation.
    pub fn add_size(&mut self, size: f32) {
        let key = (size * 10.0).round() as i32;
        *self.size_histogram.entry(key).or_insert(0) += 1;
        self.total += size as f64;
        self.count += 1;
    }

    /// Merge another histogram into this one.
    pub fn merge(&mut self, other: &FontStatistics) {
        for (key, count) in &other.size_histogram {
            *self.size_histogram.entry(*key).or_insert(0) += count;
        }
        self.total += other.total;
        self.count += other.count;
    }

    /// Most frequent size within the plausible body range, or 12pt.
    pub fn body_size(&self) -> f32 {
        self.size_histogram
            .iter()
            .filter(|(key, _)| {
                let size = **key as f32 / 10.0;
                (MIN_BODY_SIZE..=MAX_BODY_SIZE).contains(&size)
            })
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(key, _)| *key as f32 / 10.0)
            .unwrap_or(DEFAULT_BODY_SIZE)
    }

    /// Mean glyph size, if any glyph was observed.
    pub fn mean_size(&self) -> Option<f32> {
        (self.count > 0).then(|| (self.total / self.count as f64) as f32)
    }

    /// Number of observed glyphs.
    pub fn glyph_count(&self) -> usize {
        self.count
    }
}
