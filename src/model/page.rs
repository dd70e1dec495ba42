//! Page-level types: decoder input and the analyzed page model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BBox, Block, PositionedLine};
use crate::parser::DEFAULT_BODY_SIZE;

/// A vector rectangle drawn on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectShape {
    /// Rectangle bounds
    pub bbox: BBox,
    /// Stroke width in points (0 = not stroked)
    pub line_width: f32,
}

impl RectShape {
    /// Create a rectangle shape.
    pub fn new(bbox: BBox, line_width: f32) -> Self {
        Self { bbox, line_width }
    }
}

/// A raster image placed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageRegion {
    /// Image bounds
    pub bbox: BBox,
}

/// A single decoded page, as supplied by the content-stream decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub page_id: u32,
    /// Page bounds (media box)
    pub bbox: BBox,
    /// Text lines, in no particular order
    #[serde(default)]
    pub lines: Vec<PositionedLine>,
    /// Vector rectangles
    #[serde(default)]
    pub rects: Vec<RectShape>,
    /// Raster image regions
    #[serde(default)]
    pub images: Vec<ImageRegion>,
}

impl PageLayout {
    /// Create an empty page with the given dimensions.
    pub fn new(page_id: u32, width: f32, height: f32) -> Self {
        Self {
            page_id,
            bbox: BBox::new(0.0, 0.0, width, height),
            lines: Vec::new(),
            rects: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Create an empty page with standard Letter size (8.5 x 11 inches).
    pub fn letter(page_id: u32) -> Self {
        Self::new(page_id, 612.0, 792.0)
    }

    /// Add a text line.
    pub fn with_line(mut self, line: PositionedLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Add a rectangle.
    pub fn with_rect(mut self, rect: RectShape) -> Self {
        self.rects.push(rect);
        self
    }

    /// Add an image region.
    pub fn with_image(mut self, image: ImageRegion) -> Self {
        self.images.push(image);
        self
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.bbox.width()
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.bbox.height()
    }
}

/// Classification of a whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    /// Regular body content
    #[default]
    Content,
    /// Front or back cover, title page
    Cover,
    /// Full-page illustration or blank page
    Art,
    /// Staff credits
    Credits,
    /// Copyright and license boilerplate
    Legal,
    /// Table of contents
    Toc,
    /// Alphabetical index
    Index,
}

impl PageType {
    /// Placeholder section title used after a page of this type.
    pub fn placeholder_title(&self) -> String {
        let name = match self {
            PageType::Content => "Content",
            PageType::Cover => "Cover",
            PageType::Art => "Art",
            PageType::Credits => "Credits",
            PageType::Legal => "Legal",
            PageType::Toc => "Table of Contents",
            PageType::Index => "Index",
        };
        format!("({} Page)", name)
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageType::Content => "content",
            PageType::Cover => "cover",
            PageType::Art => "art",
            PageType::Credits => "credits",
            PageType::Legal => "legal",
            PageType::Toc => "toc",
            PageType::Index => "index",
        };
        f.write_str(name)
    }
}

/// A title detected at the top of a page.
#[derive(Debug, Clone)]
pub struct PageTitle<'a> {
    /// Title text (lines joined with spaces)
    pub text: String,
    /// The lines making up the title
    pub lines: Vec<&'a PositionedLine>,
}

/// A column within a zone.
#[derive(Debug, Clone)]
pub struct Column<'a> {
    /// Column bounds
    pub bbox: BBox,
    /// Lines assigned to this column, top to bottom
    pub lines: Vec<&'a PositionedLine>,
    /// Segmented blocks in reading order
    pub blocks: Vec<Block<'a>>,
}

impl<'a> Column<'a> {
    /// Create an empty column.
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            lines: Vec::new(),
            blocks: Vec::new(),
        }
    }
}

/// A horizontal band of a page with a single column count.
#[derive(Debug, Clone)]
pub struct Zone<'a> {
    /// Zone bounds
    pub bbox: BBox,
    /// Columns, left to right
    pub columns: Vec<Column<'a>>,
}

impl<'a> Zone<'a> {
    /// All lines in the zone, column by column.
    pub fn lines(&self) -> impl Iterator<Item = &'a PositionedLine> + '_ {
        self.columns.iter().flat_map(|c| c.lines.iter().copied())
    }
}

/// The analyzed form of a page.
#[derive(Debug, Clone)]
pub struct PageModel<'a> {
    /// Page number (1-indexed)
    pub page_id: u32,
    /// Page classification
    pub page_type: PageType,
    /// Most frequent glyph size among content lines
    pub body_font_size: f32,
    /// Detected page title
    pub title: Option<PageTitle<'a>>,
    /// Zones, top to bottom
    pub zones: Vec<Zone<'a>>,
    /// Stroked rectangles large enough to frame a box
    pub rects: Vec<RectShape>,
}

impl<'a> PageModel<'a> {
    /// Create a model with no content, used for non-content pages.
    pub fn empty(page_id: u32, page_type: PageType) -> Self {
        Self {
            page_id,
            page_type,
            body_font_size: DEFAULT_BODY_SIZE,
            title: None,
            zones: Vec::new(),
            rects: Vec::new(),
        }
    }

    /// Check if the page is a content page.
    pub fn is_content(&self) -> bool {
        self.page_type == PageType::Content
    }

    /// Total number of columns across zones.
    pub fn column_count(&self) -> usize {
        self.zones.iter().map(|z| z.columns.len()).sum()
    }
}
