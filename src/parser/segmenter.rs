//! Column segmentation into typed blocks.
//!
//! Lines enclosed by a framed rectangle become boxed notes. Everything else
//! is split at title lines and table headers; whatever is left is prose.

use super::fonts::FontStatistics;
use super::table_detector::TableDetector;
use crate::model::{
    BBox, Block, BoxedNoteBlock, InnerBlock, PositionedLine, ProseBlock, RectShape, TitleBlock,
};

/// Frames must be larger than this in both dimensions.
const MIN_FRAME_SIZE: f32 = 10.0;

/// Overhang allowed when testing whether a line sits inside a frame.
const FRAME_TOLERANCE: f32 = 1.0;

/// Title lines are larger than this multiple of the body size.
const TITLE_SIZE_RATIO: f32 = 1.2;

/// All-caps titles have fewer words than this.
const MAX_CAPS_TITLE_WORDS: usize = 7;

/// Centred lines sit within this share of the column width of its centre.
const COLUMN_CENTER_TOLERANCE: f32 = 0.1;

/// Adjacent titles closer than this many font sizes are merged.
const TITLE_MERGE_GAP: f32 = 1.5;

/// Lines inspected for a box title.
const BOX_TITLE_LINES: usize = 4;

/// Box title lines are larger than this multiple of the box's dominant size.
const BOX_TITLE_SIZE_RATIO: f32 = 1.1;

/// Box title lines are centred within this share of the box width.
const BOX_CENTER_TOLERANCE: f32 = 0.25;

/// Title used for boxes without a title line.
pub const DEFAULT_BOX_TITLE: &str = "Note";

/// Check whether a rectangle can frame a boxed note.
pub fn is_frame(rect: &RectShape) -> bool {
    rect.line_width > 0.0 && rect.bbox.width() > MIN_FRAME_SIZE && rect.bbox.height() > MIN_FRAME_SIZE
}

/// Split a column's lines (top to bottom) into blocks.
pub fn segment_column<'a>(
    lines: &[&'a PositionedLine],
    column: BBox,
    body_size: f32,
    rects: &[RectShape],
) -> Vec<Block<'a>> {
    let frames: Vec<BBox> = rects.iter().filter(|r| is_frame(r)).map(|r| r.bbox).collect();
    let mut blocks = Vec::new();

    let mut start = 0;
    while start < lines.len() {
        let frame = enclosing_frame(lines[start], &frames);
        let mut end = start + 1;
        while end < lines.len() && enclosing_frame(lines[end], &frames) == frame {
            end += 1;
        }

        let run = &lines[start..end];
        match frame {
            Some(index) => blocks.push(Block::BoxedNote(boxed_note(run, frames[index], body_size))),
            None => blocks.extend(segment_run(run, column, body_size).into_iter().map(Block::from)),
        }
        start = end;
    }

    blocks
}

/// Index of the smallest frame enclosing the line.
fn enclosing_frame(line: &PositionedLine, frames: &[BBox]) -> Option<usize> {
    frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.contains(&line.bbox, FRAME_TOLERANCE))
        .min_by(|a, b| {
            a.1.area()
                .partial_cmp(&b.1.area())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Build a boxed note from the lines inside one frame.
fn boxed_note<'a>(lines: &[&'a PositionedLine], frame: BBox, body_size: f32) -> BoxedNoteBlock<'a> {
    let title_count = box_title_len(lines, frame);
    let title_lines: Vec<&'a PositionedLine> = lines[..title_count].to_vec();
    let title_text = if title_lines.is_empty() {
        DEFAULT_BOX_TITLE.to_string()
    } else {
        TitleBlock::from_lines(title_lines.clone()).text
    };

    log::debug!("Boxed note {:?} with {} lines", title_text, lines.len());

    BoxedNoteBlock {
        title_text,
        title_lines,
        internal_blocks: segment_run(&lines[title_count..], frame, body_size),
        source_lines: lines.to_vec(),
    }
}

/// Number of leading lines that form the box title.
fn box_title_len(lines: &[&PositionedLine], frame: BBox) -> usize {
    let dominant = FontStatistics::from_lines(lines.iter().copied()).body_size();

    lines
        .iter()
        .take(BOX_TITLE_LINES)
        .take_while(|line| {
            let signals = [
                line.font_size() > dominant * BOX_TITLE_SIZE_RATIO,
                line.is_bold(),
                line.is_uppercase() && line.word_count() < MAX_CAPS_TITLE_WORDS,
                (line.bbox.center_x() - frame.center_x()).abs() <= frame.width() * BOX_CENTER_TOLERANCE,
            ];
            signals.iter().filter(|s| **s).count() >= 2
        })
        .count()
}

/// Check whether a line reads as a heading within its column.
fn is_title_line(line: &PositionedLine, column: BBox, body_size: f32) -> bool {
    if line.font_size() > body_size * TITLE_SIZE_RATIO {
        return true;
    }
    line.is_uppercase()
        && line.word_count() < MAX_CAPS_TITLE_WORDS
        && (line.bbox.center_x() - column.center_x()).abs() <= column.width() * COLUMN_CENTER_TOLERANCE
}

/// Split a run of unboxed lines into titles, tables and prose.
fn segment_run<'a>(lines: &[&'a PositionedLine], column: BBox, body_size: f32) -> Vec<InnerBlock<'a>> {
    let detector = TableDetector::new();
    let mut blocks = Vec::new();
    let mut prose: Vec<&'a PositionedLine> = Vec::new();

    let flush = |prose: &mut Vec<&'a PositionedLine>, blocks: &mut Vec<InnerBlock<'a>>| {
        if !prose.is_empty() {
            blocks.push(InnerBlock::Prose(ProseBlock {
                source_lines: std::mem::take(prose),
            }));
        }
    };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if is_title_line(line, column, body_size) {
            flush(&mut prose, &mut blocks);
            blocks.push(InnerBlock::Title(TitleBlock::from_lines(vec![line])));
            i += 1;
            continue;
        }

        if detector.is_header(line, body_size) {
            let count = detector
                .delimit(&lines[i..], body_size, |l| is_title_line(l, column, body_size))
                .max(1);
            let table_lines = lines[i..i + count].to_vec();
            match detector.parse(table_lines.clone(), body_size) {
                Some(table) => {
                    flush(&mut prose, &mut blocks);
                    blocks.push(InnerBlock::Table(table));
                }
                None => prose.extend(table_lines),
            }
            i += count;
            continue;
        }

        prose.push(line);
        i += 1;
    }
    flush(&mut prose, &mut blocks);

    merge_titles(blocks)
}

/// Merge consecutive title blocks that sit close together.
fn merge_titles(blocks: Vec<InnerBlock<'_>>) -> Vec<InnerBlock<'_>> {
    let mut merged: Vec<InnerBlock<'_>> = Vec::with_capacity(blocks.len());

    for block in blocks {
        if let (Some(InnerBlock::Title(prev)), InnerBlock::Title(next)) = (merged.last_mut(), &block) {
            let close = match (prev.source_lines.last(), next.source_lines.first()) {
                (Some(a), Some(b)) => a.bbox.vertical_gap(&b.bbox) < a.font_size() * TITLE_MERGE_GAP,
                _ => false,
            };
            if close {
                let mut lines = std::mem::take(&mut prev.source_lines);
                lines.extend(next.source_lines.iter().copied());
                *prev = TitleBlock::from_lines(lines);
                continue;
            }
        }
        merged.push(block);
    }

    merged
}
