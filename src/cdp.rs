//! Chrome DevTools Protocol adapter implementation

use crate::page::PageSnapshot;
use crate::{Engine, EngineConfig, Error, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// In-page collector producing a JSON-encoded [`PageSnapshot`].
const SNAPSHOT_SCRIPT: &str = include_str!("page_snapshot.js");

const DOCUMENT_HEIGHT_SCRIPT: &str =
    "Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0)";

/// Tallest full-page capture, in viewport heights.
const MAX_PAGE_SCREENS: u32 = 10;

/// CDP-based headless engine implementation (uses the `headless_chrome` crate)
///
/// This adapter launches a headless Chrome instance, manages a single tab,
/// and provides the `Engine` trait implementation over it.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    config: EngineConfig,
}

/// Decode the collector's return value.
fn parse_snapshot(value: Option<serde_json::Value>) -> Result<PageSnapshot> {
    let value = value.ok_or_else(|| Error::EvaluationError("Collector returned no value".into()))?;
    let json = value
        .as_str()
        .ok_or_else(|| Error::EvaluationError(format!("Collector returned a non-string value: {}", value)))?;
    serde_json::from_str(json).map_err(|e| Error::EvaluationError(format!("Malformed page snapshot: {}", e)))
}

impl CdpEngine {
    fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::EvaluationError(format!("Evaluation failed: {}", e)))?;
        Ok(result.value)
    }

    fn document_height(&self) -> Result<f64> {
        let result = self.tab.evaluate(DOCUMENT_HEIGHT_SCRIPT, false)?;
        Ok(result.value.and_then(|v| v.as_f64()).unwrap_or(0.0))
    }
}

impl Engine for CdpEngine {
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        // Configure headless Chrome launch options
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        // Launch the browser
        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| Error::InitializationError(format!("Failed to set user agent: {}", e)))?;

        if !config.headers.is_empty() {
            // headless_chrome expects a HashMap<&str, &str>
            let headers: std::collections::HashMap<&str, &str> = config
                .headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();

            tab.set_extra_http_headers(headers)
                .map_err(|e| Error::InitializationError(format!("Failed to set headers: {}", e)))?;
        }

        Ok(Self { browser, tab, config })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        let budget = Duration::from_millis(self.config.timeout_ms);
        let started = Instant::now();

        let navigated = self
            .tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated().map(|_| ()));
        if let Err(e) = navigated {
            if started.elapsed() >= budget {
                return Err(Error::NavigationTimeout(self.config.timeout_ms));
            }
            return Err(Error::LoadError(format!("Navigation to {} failed: {}", url, e)));
        }

        // Give late requests a chance to finish
        std::thread::sleep(Duration::from_millis(self.config.settle_ms));
        debug!("{} settled after {:?}", url, started.elapsed());
        Ok(())
    }

    fn page_snapshot(&self) -> Result<PageSnapshot> {
        let snapshot = parse_snapshot(self.evaluate(SNAPSHOT_SCRIPT)?)?;
        debug!("Collected {} elements from {}", snapshot.elements.len(), snapshot.url);
        Ok(snapshot)
    }

    fn render_png(&self) -> Result<Vec<u8>> {
        let clip = if self.config.full_page {
            let width = self.config.viewport.width as f64;
            let max_height = self.config.viewport.height.saturating_mul(MAX_PAGE_SCREENS) as f64;
            let height = self
                .document_height()?
                .clamp(self.config.viewport.height as f64, max_height);
            Some(Page::Viewport {
                x: 0.0,
                y: 0.0,
                width,
                height,
                scale: 1.0,
            })
        } else {
            None
        };

        let screenshot_data = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, clip, true)
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))?;

        Ok(screenshot_data)
    }

    fn close(self) -> Result<()> {
        // Drop the tab before the browser so the child process goes away promptly.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
