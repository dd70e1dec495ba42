//! Positioned text lines and their glyphs.
//!
//! Lines are produced by the content-stream decoder and never mutated here;
//! every higher-level view (plain text, styled text, phrases, density) is
//! derived on demand from the glyph boxes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::BBox;

/// Advance width used when synthesizing glyph boxes, as a fraction of font size.
const SYNTHETIC_ADVANCE: f32 = 0.5;

/// A single positioned character.
///
/// When deserialized without `bold` or `italic`, the flags are inferred from
/// the font name the same way [`Glyph::new`] does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GlyphRecord")]
pub struct Glyph {
    /// The character
    pub ch: char,
    /// Glyph bounding box
    pub bbox: BBox,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Font size in points
    pub size: f32,
    /// Whether the glyph is set in a bold face
    pub bold: bool,
    /// Whether the glyph is set in an italic face
    pub italic: bool,
}

/// Wire form of a glyph; style flags are optional.
#[derive(Deserialize)]
struct GlyphRecord {
    ch: char,
    bbox: BBox,
    font_name: String,
    size: f32,
    #[serde(default)]
    bold: Option<bool>,
    #[serde(default)]
    italic: Option<bool>,
}

impl From<GlyphRecord> for Glyph {
    fn from(record: GlyphRecord) -> Self {
        let (bold, italic) = style_from_font_name(&record.font_name);
        Self {
            ch: record.ch,
            bbox: record.bbox,
            font_name: record.font_name,
            size: record.size,
            bold: record.bold.unwrap_or(bold),
            italic: record.italic.unwrap_or(italic),
        }
    }
}

/// Bold and italic flags implied by a font name.
fn style_from_font_name(font_name: &str) -> (bool, bool) {
    let lower = font_name.to_lowercase();
    let bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
    let italic = lower.contains("italic") || lower.contains("oblique");
    (bold, italic)
}

impl Glyph {
    /// Create a glyph, inferring bold/italic from the font name.
    pub fn new(ch: char, bbox: BBox, font_name: impl Into<String>, size: f32) -> Self {
        let font_name = font_name.into();
        let (bold, italic) = style_from_font_name(&font_name);

        Self {
            ch,
            bbox,
            font_name,
            size,
            bold,
            italic,
        }
    }

    /// Check whether the glyph is whitespace.
    pub fn is_space(&self) -> bool {
        self.ch.is_whitespace()
    }
}

/// A run of glyphs separated from its neighbours by a wide horizontal gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    /// Text of the phrase
    pub text: String,
    /// Left edge of the first glyph
    pub x0: f32,
    /// Right edge of the last glyph
    pub x1: f32,
}

/// A line of text with its bounding box and ordered glyphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedLine {
    /// Line bounding box
    pub bbox: BBox,
    /// Glyphs in reading order
    pub glyphs: Vec<Glyph>,
}

impl PositionedLine {
    /// Create a line whose box encloses all of its glyphs.
    pub fn new(glyphs: Vec<Glyph>) -> Self {
        let bbox = glyphs
            .iter()
            .map(|g| g.bbox)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        Self { bbox, glyphs }
    }

    /// Create a line with an explicit bounding box.
    pub fn with_bbox(bbox: BBox, glyphs: Vec<Glyph>) -> Self {
        Self { bbox, glyphs }
    }

    /// Synthesize a line from text starting at `x`, with its bottom edge at `y`.
    ///
    /// Every character (spaces included) advances by half the font size.
    pub fn from_text(text: &str, x: f32, y: f32, size: f32, font_name: &str) -> Self {
        Self::from_segments(&[(x, text)], y, size, font_name)
    }

    /// Synthesize a line from text segments placed at explicit X positions.
    pub fn from_segments(segments: &[(f32, &str)], y: f32, size: f32, font_name: &str) -> Self {
        let advance = size * SYNTHETIC_ADVANCE;
        let mut glyphs = Vec::new();

        for &(start, text) in segments {
            let mut x = start;
            for ch in text.chars() {
                let bbox = BBox::new(x, y, x + advance, y + size);
                glyphs.push(Glyph::new(ch, bbox, font_name, size));
                x += advance;
            }
        }

        Self::new(glyphs)
    }

    /// Glyphs that carry ink (non-whitespace).
    fn visible(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.iter().filter(|g| !g.is_space())
    }

    /// Check if the line has no visible glyphs.
    pub fn is_blank(&self) -> bool {
        self.visible().next().is_none()
    }

    /// Plain text of the line with inter-glyph gaps turned into single spaces.
    pub fn text(&self) -> String {
        join_glyphs(&self.glyphs)
    }

    /// Text of the line with bold runs wrapped in `**` and italic runs in `*`.
    pub fn styled_text(&self) -> String {
        let mut words: Vec<(String, bool, bool)> = Vec::new();
        let mut current: Vec<&Glyph> = Vec::new();
        let mut prev: Option<&Glyph> = None;

        for glyph in &self.glyphs {
            let breaks = glyph.is_space() || prev.is_some_and(|p| needs_space(p, glyph));
            if breaks && !current.is_empty() {
                words.push(styled_word(&current));
                current.clear();
            }
            if !glyph.is_space() {
                current.push(glyph);
            }
            prev = if glyph.is_space() { None } else { Some(glyph) };
        }
        if !current.is_empty() {
            words.push(styled_word(&current));
        }

        let mut result = String::new();
        let mut index = 0;
        while index < words.len() {
            let (_, bold, italic) = words[index];
            let mut end = index;
            while end < words.len() && words[end].1 == bold && words[end].2 == italic {
                end += 1;
            }
            let run = words[index..end]
                .iter()
                .map(|(w, _, _)| w.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let marker = match (bold, italic) {
                (true, true) => "***",
                (true, false) => "**",
                (false, true) => "*",
                (false, false) => "",
            };
            if !result.is_empty() {
                result.push(' ');
            }
            result.push_str(marker);
            result.push_str(&run);
            result.push_str(marker);
            index = end;
        }

        result
    }

    /// Dominant font size of the line (most frequent visible glyph size).
    pub fn font_size(&self) -> f32 {
        let mut histogram: HashMap<i32, usize> = HashMap::new();
        for glyph in self.visible() {
            *histogram.entry((glyph.size * 10.0).round() as i32).or_insert(0) += 1;
        }

        histogram
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(key, _)| key as f32 / 10.0)
            .or_else(|| self.glyphs.first().map(|g| g.size))
            .unwrap_or(0.0)
    }

    /// Check if the line is predominantly bold.
    pub fn is_bold(&self) -> bool {
        let total = self.visible().count();
        let bold = self.visible().filter(|g| g.bold).count();
        total > 0 && bold as f32 / total as f32 > 0.5
    }

    /// Check if every visible glyph is bold and set in one font.
    pub fn is_uniform_bold(&self) -> bool {
        let mut visible = self.visible();
        match visible.next() {
            Some(first) if first.bold => {
                visible.all(|g| g.bold && g.font_name == first.font_name)
            }
            _ => false,
        }
    }

    /// Check if the line appears to be uppercase.
    pub fn is_uppercase(&self) -> bool {
        let letters: Vec<char> = self.visible().map(|g| g.ch).filter(|c| c.is_alphabetic()).collect();
        !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
    }

    /// Number of whitespace-delimited words.
    pub fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }

    /// Check if the line ends like a sentence.
    pub fn ends_sentence(&self) -> bool {
        self.text()
            .trim_end()
            .ends_with(|c: char| matches!(c, '.' | '!' | '?'))
    }

    /// Text of the glyphs whose horizontal centre lies in `[x0, x1)`.
    pub fn text_between(&self, x0: f32, x1: f32) -> String {
        join_glyphs(self.glyphs.iter().filter(|g| {
            let center = g.bbox.center_x();
            center >= x0 && center < x1
        }))
    }

    /// X position of the first visible glyph.
    pub fn first_word_x(&self) -> f32 {
        self.visible().map(|g| g.bbox.x0).next().unwrap_or(self.bbox.x0)
    }

    /// Split the line wherever the horizontal gap between glyphs exceeds `gap`.
    pub fn phrases(&self, gap: f32) -> Vec<Phrase> {
        let mut phrases = Vec::new();
        let mut start = 0;
        let mut last_visible: Option<usize> = None;

        for (i, glyph) in self.glyphs.iter().enumerate() {
            if glyph.is_space() {
                continue;
            }
            if let Some(prev) = last_visible {
                if glyph.bbox.x0 - self.glyphs[prev].bbox.x1 > gap {
                    push_phrase(&mut phrases, &self.glyphs[start..=prev]);
                    start = i;
                }
            } else {
                start = i;
            }
            last_visible = Some(i);
        }

        if let Some(prev) = last_visible {
            push_phrase(&mut phrases, &self.glyphs[start..=prev]);
        }

        phrases
    }

    /// Sum of glyph widths divided by the width of the inked extent.
    ///
    /// Tightly set table cells score near 1.0; loosely spaced lines lower.
    pub fn density(&self) -> f32 {
        let mut visible = self.visible().peekable();
        let Some(first) = visible.peek().map(|g| g.bbox.x0) else {
            return 0.0;
        };
        let mut last = first;
        let mut ink = 0.0;
        for glyph in visible {
            ink += glyph.bbox.width();
            last = last.max(glyph.bbox.x1);
        }
        let extent = last - first;
        if extent <= 0.0 {
            return 0.0;
        }
        ink / extent
    }
}

fn push_phrase(phrases: &mut Vec<Phrase>, glyphs: &[Glyph]) {
    let text = join_glyphs(glyphs);
    if text.is_empty() {
        return;
    }
    phrases.push(Phrase {
        text,
        x0: glyphs.first().map(|g| g.bbox.x0).unwrap_or(0.0),
        x1: glyphs.iter().map(|g| g.bbox.x1).fold(f32::MIN, f32::max),
    });
}

fn styled_word(glyphs: &[&Glyph]) -> (String, bool, bool) {
    let text: String = glyphs.iter().map(|g| g.ch).collect::<String>().nfc().collect();
    let bold = glyphs.iter().all(|g| g.bold);
    let italic = glyphs.iter().all(|g| g.italic);
    (text, bold, italic)
}

/// Check whether a visible gap separates two glyphs.
fn needs_space(prev: &Glyph, curr: &Glyph) -> bool {
    let gap = curr.bbox.x0 - prev.bbox.x1;
    gap > curr.size.max(prev.size) * 0.15 && !(is_spaceless_script_char(prev.ch) && is_spaceless_script_char(curr.ch))
}

/// Concatenate glyphs into normalized text with single spaces.
fn join_glyphs<'g>(glyphs: impl IntoIterator<Item = &'g Glyph>) -> String {
    let mut raw = String::new();
    let mut prev: Option<&Glyph> = None;

    for glyph in glyphs {
        if glyph.is_space() {
            raw.push(' ');
            prev = None;
            continue;
        }
        if let Some(p) = prev {
            if needs_space(p, glyph) {
                raw.push(' ');
            }
        }
        raw.push(glyph.ch);
        prev = Some(glyph);
    }

    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .nfc()
        .collect()
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Hiragana and Katakana
    || (0x3040..=0x309F).contains(&code)
    || (0x30A0..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
