//! Whole-document scan: page classification and running margin detection.
//!
//! The scan runs once over every selected page before any per-page analysis.
//! It produces a [`MarginProfile`] holding each page's type and the two
//! document-wide Y cutoffs that exclude running headers and footers.

use std::collections::{BTreeMap, BTreeSet};

use strsim::levenshtein;

use super::fonts::FontStatistics;
use super::options::{CancellationToken, ExtractOptions};
use super::patterns::{credit_keyword_count, normalize_digits, INDEX_LINE_RE, LEGAL_RE, TOC_LINE_RE};
use crate::model::{BBox, PageLayout, PageType, PositionedLine};

/// Image coverage above which a page is treated as artwork.
const IMAGE_COVERAGE_RATIO: f32 = 0.7;

/// Pages with fewer text lines are covers or art.
const MIN_TEXT_LINES: usize = 5;

/// Share of lines that must look like TOC or index entries.
const PATTERN_LINE_RATIO: f32 = 0.3;

/// Credit keywords needed for a credits page.
const MIN_CREDIT_KEYWORDS: usize = 3;

/// Lines larger than this multiple of the body size count as display text.
const LARGE_LINE_RATIO: f32 = 1.2;

/// First-page mean glyph size relative to the corpus that marks a title page.
const TITLE_PAGE_RATIO: f32 = 1.5;

/// Lines taken from the top and bottom of each page as margin candidates.
const MARGIN_LINES: usize = 3;

/// Lowest cluster score accepted as a running header or footer.
const MIN_MARGIN_SCORE: f32 = 0.6;

/// Divider rectangles are thinner than this.
const DIVIDER_MAX_HEIGHT: f32 = 5.0;

/// Divider rectangles span at least this share of the page width.
const DIVIDER_MIN_WIDTH_RATIO: f32 = 0.7;

/// Maximum distance between a margin line and its divider.
const DIVIDER_DISTANCE: f32 = 10.0;

/// Score multiplier for clusters that sit next to dividers.
const DIVIDER_BOOST: f32 = 1.25;

/// Result of the document scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarginProfile {
    page_types: BTreeMap<u32, PageType>,
    header_cutoff: Option<f32>,
    footer_cutoff: Option<f32>,
}

impl MarginProfile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type of a page.
    pub fn with_page_type(mut self, page_id: u32, page_type: PageType) -> Self {
        self.page_types.insert(page_id, page_type);
        self
    }

    /// Set the global cutoffs directly.
    pub fn with_cutoffs(mut self, header: Option<f32>, footer: Option<f32>) -> Self {
        self.header_cutoff = header;
        self.footer_cutoff = footer;
        self
    }

    /// Type of a scanned page, `None` if the page was not scanned.
    pub fn page_type(&self, page_id: u32) -> Option<PageType> {
        self.page_types.get(&page_id).copied()
    }

    /// Check whether a page was scanned.
    pub fn is_scanned(&self, page_id: u32) -> bool {
        self.page_types.contains_key(&page_id)
    }

    /// All scanned pages with their types, in page order.
    pub fn page_types(&self) -> impl Iterator<Item = (u32, PageType)> + '_ {
        self.page_types.iter().map(|(id, t)| (*id, *t))
    }

    /// Number of pages classified as content.
    pub fn content_page_count(&self) -> usize {
        self.page_types
            .values()
            .filter(|t| **t == PageType::Content)
            .count()
    }

    /// Y above which lines are dropped (`+inf` when no header was found).
    pub fn header_cutoff(&self) -> f32 {
        self.header_cutoff.unwrap_or(f32::INFINITY)
    }

    /// Y below which lines are dropped (0 when no footer was found).
    pub fn footer_cutoff(&self) -> f32 {
        self.footer_cutoff.unwrap_or(0.0)
    }

    /// Check whether a running header was found.
    pub fn has_header_cutoff(&self) -> bool {
        self.header_cutoff.is_some()
    }

    /// Check whether a running footer was found.
    pub fn has_footer_cutoff(&self) -> bool {
        self.footer_cutoff.is_some()
    }

    /// Check whether a box lies between the cutoffs (by its vertical centre).
    pub fn keeps(&self, bbox: &BBox) -> bool {
        let center = bbox.center_y();
        center >= self.footer_cutoff() && center <= self.header_cutoff()
    }
}

/// Scan all selected pages, classifying them and detecting running margins.
///
/// Cancellation is checked before each page; pages not reached stay out of
/// the profile.
pub fn scan(pages: &[PageLayout], options: &ExtractOptions, token: &CancellationToken) -> MarginProfile {
    let mut profile = MarginProfile::new();
    let mut corpus = FontStatistics::default();
    let mut first_page: Option<(u32, FontStatistics)> = None;
    let last_index = pages.len().saturating_sub(1);

    for (index, page) in pages.iter().enumerate() {
        if token.is_cancelled() {
            log::debug!("Scan cancelled before page {}", page.page_id);
            break;
        }
        if !options.pages.includes(page.page_id) {
            continue;
        }

        let stats = FontStatistics::from_lines(&page.lines);
        let page_type = classify_page(page, index == 0, index == last_index, &stats);
        log::debug!("Page {}: classified as {}", page.page_id, page_type);

        corpus.merge(&stats);
        if index == 0 {
            first_page = Some((page.page_id, stats));
        }
        profile.page_types.insert(page.page_id, page_type);
    }

    // Title pages often have enough lines to pass as content
    if let Some((page_id, stats)) = first_page {
        if profile.page_type(page_id) == Some(PageType::Content) {
            if let (Some(page_mean), Some(corpus_mean)) = (stats.mean_size(), corpus.mean_size()) {
                if page_mean > corpus_mean * TITLE_PAGE_RATIO {
                    log::debug!(
                        "Page {}: mean size {:.1} vs corpus {:.1}, reclassified as cover",
                        page_id,
                        page_mean,
                        corpus_mean
                    );
                    profile.page_types.insert(page_id, PageType::Cover);
                }
            }
        }
    }

    if options.remove_footers {
        detect_margins(pages, &mut profile);
    }

    profile
}

/// Classify a page by the first matching rule.
fn classify_page(page: &PageLayout, is_first: bool, is_last: bool, stats: &FontStatistics) -> PageType {
    let page_area = page.bbox.area();
    if page_area > 0.0 {
        let image_area: f32 = page.images.iter().map(|i| i.bbox.area()).sum();
        if image_area / page_area > IMAGE_COVERAGE_RATIO {
            return if is_first || is_last {
                PageType::Cover
            } else {
                PageType::Art
            };
        }
    }

    let lines: Vec<&PositionedLine> = page.lines.iter().filter(|l| !l.is_blank()).collect();
    if lines.is_empty() {
        return PageType::Art;
    }
    if lines.len() < MIN_TEXT_LINES {
        return if is_first { PageType::Cover } else { PageType::Art };
    }

    let texts: Vec<String> = lines.iter().map(|l| l.text()).collect();
    let full_text = texts.join("\n");
    if LEGAL_RE.is_match(&full_text) {
        return PageType::Legal;
    }

    let ratio = |count: usize| count as f32 / texts.len() as f32;
    if ratio(texts.iter().filter(|t| TOC_LINE_RE.is_match(t)).count()) >= PATTERN_LINE_RATIO {
        return PageType::Toc;
    }
    if ratio(texts.iter().filter(|t| INDEX_LINE_RE.is_match(t)).count()) >= PATTERN_LINE_RATIO {
        return PageType::Index;
    }
    if credit_keyword_count(&full_text) >= MIN_CREDIT_KEYWORDS {
        return PageType::Credits;
    }

    let body_size = stats.body_size();
    let large = lines
        .iter()
        .filter(|l| l.font_size() > body_size * LARGE_LINE_RATIO)
        .count();
    if large * 2 > lines.len() {
        return PageType::Cover;
    }

    PageType::Content
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Top,
    Bottom,
}

/// Bucket key for margin candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarginKey {
    size: i32,
    alignment: Alignment,
    half: Half,
}

struct MarginCandidate {
    key: MarginKey,
    text: String,
    bbox: BBox,
    near_divider: bool,
}

/// Lines with near-identical normalized text in one bucket.
struct MarginCluster {
    key: MarginKey,
    reference: String,
    pages: BTreeSet<u32>,
    centers: Vec<f32>,
    min_y0: f32,
    max_y1: f32,
    divider_hits: usize,
}

impl MarginCluster {
    fn new(page_id: u32, candidate: MarginCandidate) -> Self {
        let mut cluster = Self {
            key: candidate.key,
            reference: candidate.text.clone(),
            pages: BTreeSet::new(),
            centers: Vec::new(),
            min_y0: f32::INFINITY,
            max_y1: f32::NEG_INFINITY,
            divider_hits: 0,
        };
        cluster.add(page_id, &candidate);
        cluster
    }

    fn accepts(&self, candidate: &MarginCandidate) -> bool {
        if candidate.key != self.key {
            return false;
        }
        let threshold = ((self.reference.chars().count() as f32 * 0.2) as usize).max(2);
        levenshtein(&self.reference, &candidate.text) <= threshold
    }

    fn add(&mut self, page_id: u32, candidate: &MarginCandidate) {
        self.pages.insert(page_id);
        self.centers.push(candidate.bbox.center_y());
        self.min_y0 = self.min_y0.min(candidate.bbox.y0);
        self.max_y1 = self.max_y1.max(candidate.bbox.y1);
        if candidate.near_divider {
            self.divider_hits += 1;
        }
    }

    fn score(&self, content_pages: usize, page_height: f32) -> f32 {
        let frequency = self.pages.len() as f32 / content_pages.max(1) as f32;
        let stability = 1.0 - (std_dev(&self.centers) / (0.05 * page_height)).min(1.0);
        let mut score = 0.5 * frequency + 0.5 * stability;
        if self.divider_hits * 2 > self.centers.len() {
            score *= DIVIDER_BOOST;
        }
        score
    }
}

fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    variance.sqrt()
}

/// Cluster top and bottom lines across content pages into running margins.
fn detect_margins(pages: &[PageLayout], profile: &mut MarginProfile) {
    let content: Vec<&PageLayout> = pages
        .iter()
        .filter(|p| profile.page_type(p.page_id) == Some(PageType::Content))
        .collect();
    if content.len() < 2 {
        return;
    }

    let mut clusters: Vec<MarginCluster> = Vec::new();
    for page in &content {
        for candidate in margin_candidates(page) {
            match clusters.iter_mut().find(|c| c.accepts(&candidate)) {
                Some(cluster) => cluster.add(page.page_id, &candidate),
                None => clusters.push(MarginCluster::new(page.page_id, candidate)),
            }
        }
    }

    let page_height = content.iter().map(|p| p.height()).sum::<f32>() / content.len() as f32;
    let best = |half: Half| {
        clusters
            .iter()
            .filter(|c| c.key.half == half && c.pages.len() >= 2)
            .map(|c| (c, c.score(content.len(), page_height)))
            .filter(|(_, score)| *score >= MIN_MARGIN_SCORE)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(c, score)| {
                log::trace!("Margin cluster {:?} scored {:.2}", c.reference, score);
                c
            })
    };

    let header = best(Half::Top).map(|c| c.min_y0);
    let footer = best(Half::Bottom).map(|c| c.max_y1);
    let (header, footer) = resolve_cutoffs(header, footer);

    log::info!("Margin cutoffs: header={:?}, footer={:?}", header, footer);
    profile.header_cutoff = header;
    profile.footer_cutoff = footer;
}

/// Discard both cutoffs when the header sits at or below the footer.
fn resolve_cutoffs(header: Option<f32>, footer: Option<f32>) -> (Option<f32>, Option<f32>) {
    match (header, footer) {
        (Some(h), Some(f)) if h <= f => {
            log::warn!(
                "Header cutoff {:.1} is not above footer cutoff {:.1}, discarding both",
                h,
                f
            );
            (None, None)
        }
        other => other,
    }
}

/// Topmost and bottommost lines of a page, bucketed for clustering.
fn margin_candidates(page: &PageLayout) -> Vec<MarginCandidate> {
    let mut lines: Vec<&PositionedLine> = page.lines.iter().filter(|l| !l.is_blank()).collect();
    lines.sort_by(|a, b| {
        b.bbox
            .center_y()
            .partial_cmp(&a.bbox.center_y())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_end = MARGIN_LINES.min(lines.len());
    let bottom_start = lines.len().saturating_sub(MARGIN_LINES).max(top_end);
    let picked = lines[..top_end].iter().chain(lines[bottom_start..].iter());

    let page_center_x = page.bbox.center_x();
    let page_center_y = page.bbox.center_y();
    let width = page.width();

    let dividers: Vec<BBox> = page
        .rects
        .iter()
        .map(|r| r.bbox)
        .filter(|b| b.height() < DIVIDER_MAX_HEIGHT && b.width() >= width * DIVIDER_MIN_WIDTH_RATIO)
        .collect();

    picked
        .map(|line| {
            let center_x = line.bbox.center_x();
            let alignment = if (center_x - page_center_x).abs() <= width * 0.1 {
                Alignment::Center
            } else if center_x < page_center_x {
                Alignment::Left
            } else {
                Alignment::Right
            };
            let half = if line.bbox.center_y() > page_center_y {
                Half::Top
            } else {
                Half::Bottom
            };

            MarginCandidate {
                key: MarginKey {
                    size: line.font_size().round() as i32,
                    alignment,
                    half,
                },
                text: normalize_digits(&line.text()),
                bbox: line.bbox,
                near_divider: dividers
                    .iter()
                    .any(|d| d.vertical_gap(&line.bbox) <= DIVIDER_DISTANCE),
            }
        })
        .collect()
}
