//! Chrome DevTools Protocol engine implementation
//!
//! Launches a headless Chrome instance per job, manages a single tab, and
//! captures the rendered page with `Page.printToPDF`. The browser child
//! process is terminated when the engine is closed or dropped.

use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::Tab;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};

use crate::{Engine, EngineConfig, EngineFactory, Error, PdfSettings, Result};

/// CDP-based engine (uses the `headless_chrome` crate)
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
}

impl CdpEngine {
    /// Launch a fresh Chrome process and open one tab.
    ///
    /// `config.sandbox` controls the OS-level Chrome sandbox. Disabling it is
    /// only acceptable on restricted hosts (unprivileged containers) that
    /// cannot run a sandboxed Chrome; the default keeps it on.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        // The tab deadline is the primary enforcement of the navigation
        // budget; the async caller applies a second timeout as a backstop.
        tab.set_default_timeout(Duration::from_millis(config.nav_timeout_ms));

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;

        Ok(Self {
            browser,
            tab,
            config,
        })
    }
}

impl Engine for CdpEngine {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        // Let late subresources land before capture
        std::thread::sleep(Duration::from_millis(self.config.settle_ms));

        Ok(())
    }

    fn print_pdf(&self, settings: &PdfSettings) -> Result<Vec<u8>> {
        let (paper_width, paper_height) = settings.format.paper_size();
        let margins = settings.margin.profile();

        let options = PrintToPdfOptions {
            landscape: Some(settings.landscape),
            print_background: Some(settings.print_background),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(margins.top),
            margin_bottom: Some(margins.bottom),
            margin_left: Some(margins.left),
            margin_right: Some(margins.right),
            ..Default::default()
        };

        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| Error::RenderError(format!("printToPDF failed: {}", e)))
    }

    fn close(self: Box<Self>) -> Result<()> {
        // Drop the tab and browser explicitly so the child process is
        // terminated promptly rather than at some later scope exit.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

/// Factory producing [`CdpEngine`] instances; the production automation layer
pub struct CdpEngineFactory;

impl EngineFactory for CdpEngineFactory {
    fn launch(&self, config: &EngineConfig) -> Result<Box<dyn Engine>> {
        Ok(Box::new(CdpEngine::new(config.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdp_engine_creation() {
        // This test requires Chrome to be installed, so we skip it in CI
        if std::env::var("CI").is_ok() {
            return;
        }
        let config = EngineConfig {
            sandbox: false,
            ..EngineConfig::default()
        };
        match CdpEngine::new(config) {
            Ok(engine) => {
                Box::new(engine).close().unwrap();
            }
            Err(e) => {
                eprintln!(
                    "Skipping CDP engine creation test because Chrome is not available or failed to launch: {}",
                    e
                );
            }
        }
    }
}
