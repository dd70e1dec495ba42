//! Page layout analysis.
//!
//! Turns a decoded page into a [`PageModel`]: margin lines are dropped, the
//! body font size and page title are found, and the remaining lines are split
//! into zones and columns. Each column is then handed to the segmenter.

use std::cmp::Ordering;

use rayon::prelude::*;

use super::fonts::FontStatistics;
use super::options::{CancellationToken, ColumnMode, ExtractOptions};
use super::patterns::PAGE_NUMBER_RE;
use super::scanner::MarginProfile;
use super::segmenter::{is_frame, segment_column};
use crate::model::{BBox, Column, PageLayout, PageModel, PageTitle, PageType, PositionedLine, Zone};

/// Bottom share of the page searched for dynamic footers.
const FOOTER_REGION: f32 = 0.12;

/// Lines smaller than this multiple of the body size may be footers.
const FOOTER_SIZE_RATIO: f32 = 0.85;

/// Top share of the page searched for a page title.
const TITLE_REGION: f32 = 0.15;

/// Minimum size of a page title relative to the body size.
const TITLE_SIZE_RATIO: f32 = 1.4;

/// Minimum title width on multi-column pages, as a share of page width.
const TITLE_MIN_WIDTH: f32 = 0.4;

/// Title continuation lines must start within this many font sizes.
const TITLE_LINE_SPACING: f32 = 1.5;

/// Title continuation lines must align within this share of page width.
const TITLE_ALIGN_TOLERANCE: f32 = 0.2;

/// Rectangles wider than this share of the page split zones.
const ZONE_RULE_WIDTH: f32 = 0.7;

/// Half-width of the centre band ignored by column detection.
const COLUMN_LEEWAY: f32 = 0.05;

/// Analyze every scanned page in document order.
///
/// Pages missing from the profile (not selected, or not reached before
/// cancellation) are skipped, as are pages not started before the token is
/// cancelled.
pub fn analyze_pages<'a>(
    pages: &'a [PageLayout],
    profile: &MarginProfile,
    options: &ExtractOptions,
    token: &CancellationToken,
) -> Vec<PageModel<'a>> {
    let analyze = |page: &'a PageLayout| {
        if token.is_cancelled() || !profile.is_scanned(page.page_id) {
            return None;
        }
        Some(analyze_page(page, profile, options))
    };

    if options.parallel {
        pages.par_iter().filter_map(analyze).collect()
    } else {
        pages.iter().filter_map(analyze).collect()
    }
}

/// Analyze a single page.
pub fn analyze_page<'a>(
    page: &'a PageLayout,
    profile: &MarginProfile,
    options: &ExtractOptions,
) -> PageModel<'a> {
    let page_type = profile.page_type(page.page_id).unwrap_or_default();
    if page_type != PageType::Content {
        return PageModel::empty(page.page_id, page_type);
    }

    let lines = content_lines(page, profile, options);
    let body_font_size = FontStatistics::from_lines(lines.iter().copied()).body_size();
    log::debug!(
        "Page {}: {} content lines, body size {:.1}",
        page.page_id,
        lines.len(),
        body_font_size
    );

    let page_columns = match options.num_columns {
        ColumnMode::Fixed(n) => n.max(1),
        ColumnMode::Auto => detect_column_count(&lines, page.bbox),
    };
    let title = detect_title(&lines, page, body_font_size, page_columns >= 2);
    if let Some(title) = &title {
        log::debug!("Page {}: title {:?}", page.page_id, title.text);
    }

    let body_lines: Vec<&'a PositionedLine> = match &title {
        Some(title) => lines
            .iter()
            .copied()
            .filter(|l| !title.lines.iter().any(|t| std::ptr::eq(*t, *l)))
            .collect(),
        None => lines,
    };

    let rects: Vec<_> = page.rects.iter().copied().filter(is_frame).collect();

    let mut zones = Vec::new();
    for (bbox, zone_lines) in split_zones(body_lines, page, body_font_size) {
        let count = match options.num_columns {
            ColumnMode::Fixed(n) => n.max(1),
            ColumnMode::Auto => detect_column_count(&zone_lines, bbox),
        };
        let mut columns = split_columns(zone_lines, bbox, count);
        for column in &mut columns {
            column.blocks = segment_column(&column.lines, column.bbox, body_font_size, &rects);
        }
        zones.push(Zone { bbox, columns });
    }

    log::debug!(
        "Page {}: {} zones, {} columns",
        page.page_id,
        zones.len(),
        zones.iter().map(|z| z.columns.len()).sum::<usize>()
    );

    PageModel {
        page_id: page.page_id,
        page_type,
        body_font_size,
        title,
        zones,
        rects,
    }
}

/// Order lines top to bottom, then left to right.
pub(crate) fn reading_order(a: &&PositionedLine, b: &&PositionedLine) -> Ordering {
    b.bbox
        .y1
        .partial_cmp(&a.bbox.y1)
        .unwrap_or(Ordering::Equal)
        .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
}

/// Visible lines between the global cutoffs, minus any per-page footer.
fn content_lines<'a>(
    page: &'a PageLayout,
    profile: &MarginProfile,
    options: &ExtractOptions,
) -> Vec<&'a PositionedLine> {
    let mut lines: Vec<&'a PositionedLine> = page.lines.iter().filter(|l| !l.is_blank()).collect();

    if options.remove_footers {
        lines.retain(|l| profile.keeps(&l.bbox));

        if !profile.has_footer_cutoff() {
            let body_size = FontStatistics::from_lines(lines.iter().copied()).body_size();
            let cutoff = dynamic_footer_cutoff(&lines, page, body_size);
            if cutoff > 0.0 {
                log::debug!("Page {}: dynamic footer cutoff {:.1}", page.page_id, cutoff);
                lines.retain(|l| l.bbox.center_y() >= cutoff);
            }
        }
    }

    lines.sort_by(reading_order);
    lines
}

/// Per-page footer cutoff: just above the highest page-number or small-print
/// line in the bottom of the page, or 0 when there is none.
fn dynamic_footer_cutoff(lines: &[&PositionedLine], page: &PageLayout, body_size: f32) -> f32 {
    let region_top = page.bbox.y0 + page.height() * FOOTER_REGION;

    lines
        .iter()
        .filter(|l| l.bbox.center_y() < region_top)
        .filter(|l| {
            PAGE_NUMBER_RE.is_match(&l.text()) || l.font_size() < body_size * FOOTER_SIZE_RATIO
        })
        .map(|l| l.bbox.y1)
        .fold(None, |max: Option<f32>, y| Some(max.map_or(y, |m| m.max(y))))
        .map(|y| y + 1.0)
        .unwrap_or(0.0)
}

/// Find a large heading at the top of the page, with its continuation lines.
fn detect_title<'a>(
    lines: &[&'a PositionedLine],
    page: &PageLayout,
    body_size: f32,
    multi_column: bool,
) -> Option<PageTitle<'a>> {
    let region_bottom = page.bbox.y1 - page.height() * TITLE_REGION;
    let width = page.width();

    let start = lines.iter().position(|l| {
        l.bbox.center_y() >= region_bottom
            && l.font_size() > body_size * TITLE_SIZE_RATIO
            && (!multi_column || l.bbox.width() >= width * TITLE_MIN_WIDTH)
    })?;

    let title_size = lines[start].font_size();
    let mut title_lines = vec![lines[start]];

    for next in &lines[start + 1..] {
        let prev = title_lines[title_lines.len() - 1];
        let size = next.font_size();

        let close = prev.bbox.y1 - next.bbox.y1 <= size * TITLE_LINE_SPACING;
        let aligned = (prev.bbox.center_x() - next.bbox.center_x()).abs() <= width * TITLE_ALIGN_TOLERANCE
            || (prev.bbox.x0 - next.bbox.x0).abs() <= width * TITLE_ALIGN_TOLERANCE;
        if !close || !aligned {
            break;
        }

        let same_size = (size - title_size).abs() < 0.5;
        let subtitle = size < title_size
            && next.bbox.width() < prev.bbox.width()
            && !next.ends_sentence();
        if !same_size && !subtitle {
            break;
        }
        title_lines.push(*next);
    }

    let text = title_lines
        .iter()
        .map(|l| l.text())
        .collect::<Vec<_>>()
        .join(" ");

    Some(PageTitle {
        text,
        lines: title_lines,
    })
}

/// Horizontal bands between full-width rules, top to bottom.
fn zone_bands(page: &PageLayout, body_size: f32) -> Vec<BBox> {
    let width = page.width();
    let mut edges = vec![page.bbox.y1, page.bbox.y0];
    for rect in page.rects.iter().filter(|r| r.bbox.width() > width * ZONE_RULE_WIDTH) {
        edges.push(rect.bbox.y1);
        edges.push(rect.bbox.y0);
    }

    edges.retain(|y| *y >= page.bbox.y0 && *y <= page.bbox.y1);
    edges.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    edges.dedup_by(|a, b| (*a - *b).abs() < 0.5);

    let bands: Vec<BBox> = edges
        .windows(2)
        .filter(|pair| pair[0] - pair[1] > body_size)
        .map(|pair| BBox::new(page.bbox.x0, pair[1], page.bbox.x1, pair[0]))
        .collect();

    if bands.is_empty() {
        vec![page.bbox]
    } else {
        bands
    }
}

/// Assign each line to the zone holding its vertical centre (or the nearest
/// zone). Zones without lines are dropped.
fn split_zones<'a>(
    lines: Vec<&'a PositionedLine>,
    page: &PageLayout,
    body_size: f32,
) -> Vec<(BBox, Vec<&'a PositionedLine>)> {
    let bands = zone_bands(page, body_size);
    let mut buckets: Vec<Vec<&'a PositionedLine>> = vec![Vec::new(); bands.len()];

    for line in lines {
        let center = line.bbox.center_y();
        let distance = |band: &BBox| {
            if center > band.y1 {
                center - band.y1
            } else if center < band.y0 {
                band.y0 - center
            } else {
                0.0
            }
        };
        let index = bands
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| distance(a).partial_cmp(&distance(b)).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        buckets[index].push(line);
    }

    bands
        .into_iter()
        .zip(buckets)
        .filter(|(_, lines)| !lines.is_empty())
        .collect()
}

/// Decide whether a region holds one or two columns of text.
pub fn detect_column_count(lines: &[&PositionedLine], bbox: BBox) -> usize {
    if lines.len() < 2 {
        return 1;
    }

    let mid = bbox.center_x();
    let leeway = bbox.width() * COLUMN_LEEWAY;

    let left: Vec<&&PositionedLine> = lines.iter().filter(|l| l.bbox.center_x() < mid - leeway).collect();
    let right: Vec<&&PositionedLine> = lines.iter().filter(|l| l.bbox.center_x() > mid + leeway).collect();
    let straddling = lines.len() - left.len() - right.len();

    if straddling * 4 > lines.len() || left.is_empty() || right.is_empty() {
        return 1;
    }

    // Gutter check
    let left_edge = left.iter().map(|l| l.bbox.x1).fold(f32::MIN, f32::max);
    let right_edge = right.iter().map(|l| l.bbox.x0).fold(f32::MAX, f32::min);
    if left_edge < right_edge {
        log::trace!("Gutter between {:.1} and {:.1}", left_edge, right_edge);
        return 2;
    }

    // Width fallback
    let extent = |side: &[&&PositionedLine]| {
        let x0 = side.iter().map(|l| l.bbox.x0).fold(f32::MAX, f32::min);
        let x1 = side.iter().map(|l| l.bbox.x1).fold(f32::MIN, f32::max);
        x1 - x0
    };
    let limit = bbox.width() / 2.0 * 1.1;
    if extent(left.as_slice()) < limit && extent(right.as_slice()) < limit {
        return 2;
    }

    1
}

/// Distribute lines into `count` equal-width columns by horizontal centre.
fn split_columns<'a>(lines: Vec<&'a PositionedLine>, bbox: BBox, count: usize) -> Vec<Column<'a>> {
    let count = count.max(1);
    let bin_width = bbox.width() / count as f32;

    let mut columns: Vec<Column<'a>> = (0..count)
        .map(|i| {
            let x0 = bbox.x0 + bin_width * i as f32;
            Column::new(BBox::new(x0, bbox.y0, x0 + bin_width, bbox.y1))
        })
        .collect();

    for line in lines {
        let offset = (line.bbox.center_x() - bbox.x0) / bin_width;
        let index = (offset.floor().max(0.0) as usize).min(count - 1);
        columns[index].lines.push(line);
    }

    for column in &mut columns {
        column.lines.sort_by(reading_order);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RectShape;

    fn line(text: &str, x: f32, y: f32) -> PositionedLine {
        PositionedLine::from_text(text, x, y, 10.0, "Times-Roman")
    }

    fn content_profile(page_id: u32) -> MarginProfile {
        MarginProfile::new().with_page_type(page_id, PageType::Content)
    }

    fn two_column_page() -> PageLayout {
        let mut page = PageLayout::letter(1);
        for i in 0..8 {
            let y = 600.0 - i as f32 * 11.0;
            page = page
                .with_line(line("left column words here and more", 50.0, y))
                .with_line(line("right column words here and more", 330.0, y));
        }
        page
    }

    fn contains(lines: &[&PositionedLine], target: &PositionedLine) -> usize {
        lines.iter().filter(|l| std::ptr::eq(**l, target)).count()
    }

    // ====== Margins ======

    #[test]
    fn test_global_cutoffs_filter_lines() {
        let page = PageLayout::letter(1)
            .with_line(line("Running head", 72.0, 760.0))
            .with_line(line("Body text", 72.0, 500.0))
            .with_line(line("12", 300.0, 30.0));
        let profile = content_profile(1).with_cutoffs(Some(760.0), Some(40.0));

        let lines = content_lines(&page, &profile, &ExtractOptions::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Body text");
    }

    #[test]
    fn test_dynamic_footer() {
        let page = PageLayout::letter(1)
            .with_line(line("Body text that is long enough", 72.0, 500.0))
            .with_line(line("More body text here", 72.0, 489.0))
            .with_line(line("Page 7", 300.0, 30.0))
            .with_line(PositionedLine::from_text("(c) small print", 72.0, 50.0, 6.0, "Times"));
        let profile = content_profile(1);

        let lines = content_lines(&page, &profile, &ExtractOptions::default());
        assert_eq!(lines.len(), 2);

        let all: Vec<&PositionedLine> = page.lines.iter().collect();
        assert_eq!(dynamic_footer_cutoff(&all, &page, 10.0), 57.0);
    }

    #[test]
    fn test_no_dynamic_footer_when_disabled() {
        let page = PageLayout::letter(1)
            .with_line(line("Body text", 72.0, 500.0))
            .with_line(line("Page 7", 300.0, 30.0));
        let options = ExtractOptions::default().with_remove_footers(false);
        let lines = content_lines(&page, &content_profile(1), &options);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_dynamic_footer_ignores_body_lines_low_on_page() {
        let page = PageLayout::letter(1).with_line(line("A sentence near the bottom.", 72.0, 60.0));
        let all: Vec<&PositionedLine> = page.lines.iter().collect();
        assert_eq!(dynamic_footer_cutoff(&all, &page, 10.0), 0.0);
    }

    // ====== Title ======

    #[test]
    fn test_page_title_with_subtitle() {
        let title = PositionedLine::from_text("THE SUNKEN KEEP", 230.0, 720.0, 20.0, "Times-Bold");
        let subtitle = PositionedLine::from_text("an adventure for", 250.0, 706.0, 14.0, "Times");
        let body = line("The keep lies beneath the lake.", 72.0, 650.0);
        let lines = vec![&title, &subtitle, &body];

        let found = detect_title(&lines, &PageLayout::letter(1), 10.0, false).unwrap();
        assert_eq!(found.text, "THE SUNKEN KEEP an adventure for");
        assert_eq!(found.lines.len(), 2);
    }

    #[test]
    fn test_no_title_for_body_text() {
        let body = line("The keep lies beneath the lake.", 72.0, 720.0);
        assert!(detect_title(&[&body], &PageLayout::letter(1), 10.0, false).is_none());
    }

    #[test]
    fn test_narrow_title_rejected_on_multi_column_page() {
        let title = PositionedLine::from_text("KEEP", 72.0, 720.0, 20.0, "Times-Bold");
        let page = PageLayout::letter(1);
        assert!(detect_title(&[&title], &page, 10.0, true).is_none());
        assert!(detect_title(&[&title], &page, 10.0, false).is_some());
    }

    // ====== Zones and columns ======

    #[test]
    fn test_zone_bands_split_on_rules() {
        let page = PageLayout::letter(1).with_rect(RectShape::new(BBox::new(20.0, 400.0, 592.0, 401.0), 1.0));
        let bands = zone_bands(&page, 10.0);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].y1, 792.0);
        assert_eq!(bands[0].y0, 401.0);
        assert_eq!(bands[1].y1, 400.0);
        assert_eq!(bands[1].y0, 0.0);
    }

    #[test]
    fn test_detect_two_columns_by_gutter() {
        let page = two_column_page();
        let lines: Vec<&PositionedLine> = page.lines.iter().collect();
        assert_eq!(detect_column_count(&lines, page.bbox), 2);
    }

    #[test]
    fn test_single_column_prose() {
        let page = (0..6).fold(PageLayout::letter(1), |page, i| {
            page.with_line(line(
                "a single wide column of prose that runs across most of the page width",
                72.0,
                600.0 - i as f32 * 11.0,
            ))
        });
        let lines: Vec<&PositionedLine> = page.lines.iter().collect();
        assert_eq!(detect_column_count(&lines, page.bbox), 1);
    }

    #[test]
    fn test_fixed_column_mode() {
        let page = two_column_page();
        let options = ExtractOptions::default().with_columns(ColumnMode::Fixed(1));
        let model = analyze_page(&page, &content_profile(1), &options);
        assert_eq!(model.column_count(), 1);

        let model = analyze_page(&page, &content_profile(1), &ExtractOptions::default());
        assert_eq!(model.column_count(), 2);
        assert_eq!(model.zones[0].columns[0].lines.len(), 8);
        assert_eq!(model.zones[0].columns[1].lines.len(), 8);
    }

    #[test]
    fn test_zone_and_column_coverage() {
        let page = two_column_page()
            .with_rect(RectShape::new(BBox::new(20.0, 560.0, 592.0, 561.0), 0.5))
            .with_line(PositionedLine::from_text("FULL WIDTH HEADING", 230.0, 720.0, 20.0, "Times-Bold"))
            .with_line(line("A line sitting on the rule", 200.0, 556.0));
        let profile = content_profile(1);
        let options = ExtractOptions::default();

        let content = content_lines(&page, &profile, &options);
        let model = analyze_page(&page, &profile, &options);
        assert!(model.zones.len() >= 2);

        let mut covered: Vec<&PositionedLine> = model.zones.iter().flat_map(|z| z.lines()).collect();
        if let Some(title) = &model.title {
            covered.extend(title.lines.iter().copied());
        }

        assert_eq!(covered.len(), content.len());
        for line in &content {
            assert_eq!(contains(&covered, line), 1);
        }

        for zone in &model.zones {
            let zone_lines: Vec<&PositionedLine> = zone.lines().collect();
            let column_total: usize = zone.columns.iter().map(|c| c.lines.len()).sum();
            assert_eq!(zone_lines.len(), column_total);
        }
    }

    #[test]
    fn test_non_content_page_is_empty() {
        let page = two_column_page();
        let profile = MarginProfile::new().with_page_type(1, PageType::Credits);
        let model = analyze_page(&page, &profile, &ExtractOptions::default());
        assert_eq!(model.page_type, PageType::Credits);
        assert!(model.zones.is_empty());
    }

    #[test]
    fn test_analyze_pages_skips_unscanned_and_cancelled() {
        let pages = vec![two_column_page(), {
            let mut page = two_column_page();
            page.page_id = 2;
            page
        }];
        let profile = content_profile(1);
        let options = ExtractOptions::default();

        let models = analyze_pages(&pages, &profile, &options, &CancellationToken::new());
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].page_id, 1);

        let token = CancellationToken::new();
        token.cancel();
        assert!(analyze_pages(&pages, &profile, &options, &token).is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pages: Vec<PageLayout> = (1..=4)
            .map(|id| {
                let mut page = two_column_page();
                page.page_id = id;
                page
            })
            .collect();
        let profile = (1..=4).fold(MarginProfile::new(), |p, id| p.with_page_type(id, PageType::Content));
        let token = CancellationToken::new();

        let parallel = analyze_pages(&pages, &profile, &ExtractOptions::default(), &token);
        let sequential = analyze_pages(&pages, &profile, &ExtractOptions::default().sequential(), &token);
        let ids = |models: &[PageModel]| models.iter().map(|m| m.page_id).collect::<Vec<_>>();
        assert_eq!(ids(&parallel), ids(&sequential));
        assert_eq!(ids(&parallel), vec![1, 2, 3, 4]);
    }
}
