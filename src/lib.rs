//! Pagepress
//!
//! An HTTP service that loads an arbitrary web page in an isolated headless
//! Chrome process and returns it as a print-ready PDF.
//!
//! Every request gets its own browser process: validate the target URL, launch
//! Chrome, open one tab, navigate until the page quiesces, capture the PDF,
//! and tear the process down before the response is emitted. The automation
//! layer sits behind the [`Engine`] / [`EngineFactory`] traits so the server
//! can be exercised in tests without a real browser.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pagepress::{cdp::CdpEngineFactory, server, EngineConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let state = server::AppState::new(Arc::new(CdpEngineFactory), EngineConfig::default(), 4);
//! let app = server::router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod cdp;
pub mod job;
pub mod server;
pub mod validate;

pub use job::RenderJob;
pub use validate::{RenderPayload, RenderRequest};

/// Configuration for a browser engine instance
///
/// One of these is built from the CLI at startup and cloned into every render
/// job; each job launches a fresh engine from it. Defaults are conservative:
/// the Chrome OS-level sandbox stays enabled and must be switched off
/// explicitly for hosts that cannot support it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Viewport dimensions for the tab
    pub viewport: Viewport,
    /// Hard navigation timeout in milliseconds
    pub nav_timeout_ms: u64,
    /// Settle delay after navigation completes, letting late subresources land
    pub settle_ms: u64,
    /// Whether Chrome runs with its OS-level sandbox enabled
    pub sandbox: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Pagepress/0.1"
                .to_string(),
            viewport: Viewport::default(),
            nav_timeout_ms: 60_000,
            settle_ms: 500,
            sandbox: true,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Paper format for the produced document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageFormat {
    /// Paper size in inches (width, height) for portrait orientation.
    /// Orientation is applied separately by the capture layer.
    pub fn paper_size(self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
        }
    }

    /// Parse a wire value, falling back to A4 for anything unrecognised.
    /// The payload field is free-form; only the URL can reject a request.
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "letter" => PageFormat::Letter,
            "legal" => PageFormat::Legal,
            _ => PageFormat::A4,
        }
    }
}

/// Margin profile for the produced document
///
/// Binary by design: either the fixed profile (20 mm top/bottom, 15 mm
/// left/right) or no margins at all. There is no custom-margin input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginMode {
    #[default]
    Default,
    None,
}

const MM_PER_INCH: f64 = 25.4;

impl MarginMode {
    /// The margin profile in inches, as CDP expects them.
    pub fn profile(self) -> Margins {
        match self {
            MarginMode::Default => Margins {
                top: 20.0 / MM_PER_INCH,
                bottom: 20.0 / MM_PER_INCH,
                left: 15.0 / MM_PER_INCH,
                right: 15.0 / MM_PER_INCH,
            },
            MarginMode::None => Margins {
                top: 0.0,
                bottom: 0.0,
                left: 0.0,
                right: 0.0,
            },
        }
    }
}

/// Page margins in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Capture options for one PDF render, already validated
#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub format: PageFormat,
    pub landscape: bool,
    pub print_background: bool,
    pub margin: MarginMode,
}

/// Core trait for browser engine implementations
///
/// One engine instance backs exactly one render job: a single process with a
/// single page, used sequentially and then closed. Implementations are driven
/// from a dedicated worker thread (see [`RenderJob`]) and never cross threads,
/// so no `Send` bound is required.
pub trait Engine {
    /// Navigate the page to a URL and wait until it has quiesced
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Capture the current page as a PDF
    fn print_pdf(&self, settings: &PdfSettings) -> Result<Vec<u8>>;

    /// Close the engine and terminate the underlying browser process
    fn close(self: Box<Self>) -> Result<()>;
}

/// Factory seam for launching engines
///
/// The server holds one of these as a trait object so tests can substitute a
/// fake automation layer for the real Chrome-backed one.
pub trait EngineFactory: Send + Sync {
    /// Launch a fresh, isolated engine instance
    fn launch(&self, config: &EngineConfig) -> Result<Box<dyn Engine>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 720);
        assert_eq!(config.nav_timeout_ms, 60_000);
        assert!(config.sandbox);
    }

    #[test]
    fn test_paper_sizes() {
        assert_eq!(PageFormat::A4.paper_size(), (8.27, 11.69));
        assert_eq!(PageFormat::Letter.paper_size(), (8.5, 11.0));
        assert_eq!(PageFormat::Legal.paper_size(), (8.5, 14.0));
    }

    #[test]
    fn test_format_param_parsing() {
        assert_eq!(PageFormat::from_param("A4"), PageFormat::A4);
        assert_eq!(PageFormat::from_param("letter"), PageFormat::Letter);
        assert_eq!(PageFormat::from_param(" LEGAL "), PageFormat::Legal);
        // Free-form field: unknown values fall back to A4 rather than erroring
        assert_eq!(PageFormat::from_param("tabloid"), PageFormat::A4);
        assert_eq!(PageFormat::from_param(""), PageFormat::A4);
    }

    #[test]
    fn test_margin_profiles() {
        let fixed = MarginMode::Default.profile();
        assert!((fixed.top - 0.7874).abs() < 1e-3);
        assert!((fixed.bottom - 0.7874).abs() < 1e-3);
        assert!((fixed.left - 0.5906).abs() < 1e-3);
        assert!((fixed.right - 0.5906).abs() < 1e-3);

        let none = MarginMode::None.profile();
        assert_eq!(none.top, 0.0);
        assert_eq!(none.right, 0.0);
    }
}
