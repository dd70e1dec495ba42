//! Page analysis: document scan, per-page layout and column segmentation.

mod fonts;
mod layout;
mod options;
mod patterns;
mod scanner;
mod segmenter;
mod table_detector;

pub use fonts::{FontStatistics, DEFAULT_BODY_SIZE};
pub use layout::{analyze_page, analyze_pages, detect_column_count};
pub use options::{CancellationToken, ColumnMode, ExtractOptions, PageSelection};
pub use scanner::{scan, MarginProfile};
pub use segmenter::{is_frame, segment_column, DEFAULT_BOX_TITLE};
pub use table_detector::{TableDetector, TableDetectorConfig};
