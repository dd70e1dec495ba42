//! # pdfsections
//!
//! Structural parsing of positioned PDF page layouts into titled sections.
//!
//! A content-stream decoder supplies pages as positioned text lines, vector
//! rectangles and image regions. This library infers the logical structure
//! from geometry and font metrics alone and returns an ordered list of
//! [`Section`]s, each holding prose or table [`Paragraph`]s with their page
//! numbers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsections::{extract_file, render, ExtractOptions};
//!
//! fn main() -> pdfsections::Result<()> {
//!     // Pages decoded elsewhere and handed over as JSON
//!     let sections = extract_file("pages.json", &ExtractOptions::default())?;
//!
//!     println!("{}", render::to_markdown(&sections));
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. [`parser::scan`] classifies every page (cover, credits, table of
//!    contents...) and finds running header/footer cutoffs across pages.
//! 2. [`parser::analyze_pages`] builds a [`PageModel`] per content page:
//!    page title, zones, columns and typed blocks. Pages run in parallel.
//! 3. [`render::reconstruct`] walks the blocks in reading order and stitches
//!    them into sections.
//!
//! Layout heuristics never fail. Misclassification degrades formatting, but
//! only missing or malformed input is reported as an error.

pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{
    BBox, Block, Glyph, ImageRegion, PageLayout, PageModel, PageType, Paragraph, PositionedLine,
    RectShape, Section,
};
pub use parser::{CancellationToken, ColumnMode, ExtractOptions, PageSelection};
pub use render::JsonFormat;

use std::path::Path;

/// Extract sections from decoded pages.
///
/// # Arguments
///
/// * `pages` - Decoded pages in document order
/// * `options` - Extraction options
///
/// # Example
///
/// ```
/// use pdfsections::{extract_sections, ExtractOptions, PageLayout, PositionedLine};
///
/// let page = PageLayout::letter(1)
///     .with_line(PositionedLine::from_text("Hello there.", 72.0, 700.0, 10.0, "Helvetica"));
/// let sections = extract_sections(&[page], &ExtractOptions::default()).unwrap();
/// assert!(sections.len() <= 1);
/// ```
pub fn extract_sections(pages: &[PageLayout], options: &ExtractOptions) -> Result<Vec<Section>> {
    extract_sections_with_cancel(pages, options, &CancellationToken::new())
}

/// Extract sections, checking `token` between pages.
///
/// Pages not reached before cancellation are skipped; sections built from the
/// pages already analyzed are still returned.
pub fn extract_sections_with_cancel(
    pages: &[PageLayout],
    options: &ExtractOptions,
    token: &CancellationToken,
) -> Result<Vec<Section>> {
    if pages.is_empty() {
        log::info!("No pages to extract");
        return Ok(Vec::new());
    }

    let profile = parser::scan(pages, options, token);
    if profile.content_page_count() == 0 {
        log::info!("No content pages among {} scanned pages", profile.page_types().count());
        return Ok(Vec::new());
    }

    let models = parser::analyze_pages(pages, &profile, options, token);
    Ok(render::reconstruct(&models, options))
}

/// Load pages from a JSON file and extract sections.
///
/// The file holds a JSON array of [`PageLayout`], the hand-off format of the
/// content-stream decoder.
///
/// # Example
///
/// ```no_run
/// use pdfsections::{extract_file, ExtractOptions};
///
/// let sections = extract_file("pages.json", &ExtractOptions::default()).unwrap();
/// println!("{} sections", sections.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<Vec<Section>> {
    let pages = load_pages(path)?;
    extract_sections(&pages, options)
}

/// Read a JSON array of pages from disk.
pub fn load_pages<P: AsRef<Path>>(path: P) -> Result<Vec<PageLayout>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    let data = std::fs::read_to_string(path)?;
    let pages: Vec<PageLayout> = serde_json::from_str(&data)?;
    log::debug!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// Builder for extracting and rendering sections.
///
/// # Example
///
/// ```no_run
/// use pdfsections::{ColumnMode, Extractor, PageSelection};
///
/// let markdown = Extractor::new()
///     .columns(ColumnMode::Fixed(2))
///     .keep_style(true)
///     .with_pages(PageSelection::Range(3..=40))
///     .extract_file("pages.json")?
///     .to_markdown();
/// # Ok::<(), pdfsections::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
    token: CancellationToken,
}

impl Extractor {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from existing options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            options,
            token: CancellationToken::new(),
        }
    }

    /// Set the column detection mode.
    pub fn columns(mut self, mode: ColumnMode) -> Self {
        self.options = self.options.with_columns(mode);
        self
    }

    /// Keep bold/italic spans as inline Markdown markers.
    pub fn keep_style(mut self, keep: bool) -> Self {
        self.options = self.options.with_keep_style(keep);
        self
    }

    /// Enable or disable running header/footer removal.
    pub fn remove_footers(mut self, remove: bool) -> Self {
        self.options = self.options.with_remove_footers(remove);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Use a shared cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Get the configured options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract sections from decoded pages.
    pub fn extract(&self, pages: &[PageLayout]) -> Result<ExtractResult> {
        let sections = extract_sections_with_cancel(pages, &self.options, &self.token)?;
        Ok(ExtractResult { sections })
    }

    /// Load pages from a JSON file and extract sections.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<ExtractResult> {
        let pages = load_pages(path)?;
        self.extract(&pages)
    }
}

/// Sections extracted from a document.
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    sections: Vec<Section>,
}

impl ExtractResult {
    /// Get the sections.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Take ownership of the sections.
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    /// Check if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Convert to Markdown.
    pub fn to_markdown(&self) -> String {
        render::to_markdown(&self.sections)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> String {
        render::to_text(&self.sections)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.sections, format)
    }
}
