//! Extraction options and configuration.

use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Options for extracting sections from page layouts.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Column detection mode
    pub num_columns: ColumnMode,

    /// Whether running headers and footers are removed
    pub remove_footers: bool,

    /// Whether bold/italic spans are kept as inline Markdown markers
    pub keep_style: bool,

    /// Page selection (which pages to analyze)
    pub pages: PageSelection,

    /// Whether to analyze pages in parallel
    pub parallel: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column detection mode.
    pub fn with_columns(mut self, mode: ColumnMode) -> Self {
        self.num_columns = mode;
        self
    }

    /// Enable or disable header/footer removal.
    pub fn with_remove_footers(mut self, remove: bool) -> Self {
        self.remove_footers = remove;
        self
    }

    /// Enable or disable inline style markers.
    pub fn with_keep_style(mut self, keep: bool) -> Self {
        self.keep_style = keep;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            num_columns: ColumnMode::Auto,
            remove_footers: true,
            keep_style: false,
            pages: PageSelection::All,
            parallel: true,
        }
    }
}

/// How many columns each zone is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnMode {
    /// Detect one or two columns per zone
    #[default]
    Auto,
    /// Force a fixed column count
    Fixed(usize),
}

impl ColumnMode {
    /// Parse a column mode string ("auto" or a positive number).
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ColumnMode::Auto);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(ColumnMode::Fixed(n)),
            _ => Err(Error::InvalidColumnMode(s.to_string())),
        }
    }
}

impl FromStr for ColumnMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Page selection for analysis.
#[derive(Debug, Clone, Default)]
pub enum PageSelection {
    /// Analyze all pages
    #[default]
    All,
    /// Analyze a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Analyze specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());

        // Simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| invalid())?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort();
        Ok(PageSelection::Pages(pages))
    }
}

/// Cooperative cancellation flag shared between the caller and the engine.
///
/// The engine checks it between pages; pages not yet reached are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .with_columns(ColumnMode::Fixed(2))
            .with_keep_style(true)
            .with_remove_footers(false)
            .sequential();

        assert_eq!(options.num_columns, ColumnMode::Fixed(2));
        assert!(options.keep_style);
        assert!(!options.remove_footers);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.num_columns, ColumnMode::Auto);
        assert!(options.remove_footers);
        assert!(!options.keep_style);
        assert!(options.parallel);
    }

    #[test]
    fn test_column_mode_parse() {
        assert_eq!(ColumnMode::parse("auto").unwrap(), ColumnMode::Auto);
        assert_eq!(ColumnMode::parse(" AUTO ").unwrap(), ColumnMode::Auto);
        assert_eq!("3".parse::<ColumnMode>().unwrap(), ColumnMode::Fixed(3));
        assert!(matches!(ColumnMode::parse("0"), Err(Error::InvalidColumnMode(_))));
        assert!(ColumnMode::parse("two").is_err());
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes(100));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
        assert!(pages.includes(3));
    }

    #[test]
    fn test_page_selection_parse() {
        let all = PageSelection::parse("all").unwrap();
        assert!(matches!(all, PageSelection::All));

        let range = PageSelection::parse("1-10").unwrap();
        assert!(matches!(range, PageSelection::Range(_)));

        let mixed = PageSelection::parse("1,3,5-7,10").unwrap();
        if let PageSelection::Pages(pages) = mixed {
            assert_eq!(pages, vec![1, 3, 5, 6, 7, 10]);
        } else {
            panic!("Expected Pages variant");
        }

        assert!(matches!(
            PageSelection::parse("x-3"),
            Err(Error::InvalidPageRange(_))
        ));
        assert!(PageSelection::parse("9-2").is_err());
    }

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
