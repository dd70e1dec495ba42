//! Error types for pdfsections.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfsections operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during section extraction.
///
/// Layout heuristics never fail; only missing or malformed input and invalid
/// configuration are reported here.
#[derive(Error, Debug)]
pub enum Error {
    /// The input source does not exist or cannot be opened.
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// I/O error when reading input.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The page layout payload is not valid JSON for the expected schema.
    #[error("Invalid page layout data: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed page range string.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Malformed column mode string.
    #[error("Invalid column mode: {0}")]
    InvalidColumnMode(String),

    /// Error during rendering (Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}
