//! Error types for the render service

use thiserror::Error;

/// Result type alias for render operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a page to PDF
#[derive(Error, Debug)]
pub enum Error {
    /// The target URL was rejected before any browser was launched
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to launch the browser process or open a tab
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to navigate to the target page
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to capture the page as a PDF
    #[error("PDF capture failed: {0}")]
    RenderError(String),

    /// Navigation did not quiesce within the configured budget
    #[error("Navigation timed out after {0}ms")]
    Timeout(u64),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this failure belongs to the validation stage, i.e. it was
    /// produced before a browser process existed.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidUrl(_))
    }
}
