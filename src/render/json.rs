//! JSON rendering for extracted sections.

use crate::error::{Error, Result};
use crate::model::Section;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert sections to a JSON array.
pub fn to_json(sections: &[Section], format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(sections),
        JsonFormat::Compact => serde_json::to_string(sections),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
