//! Themeshot
//!
//! Website screenshots plus brand theme extraction. A page is analyzed along
//! one of two paths that produce the same [`Theme`] shape:
//!
//! - **Pixels**: a PNG/JPEG screenshot is quantized into six named swatches
//!   ([`palette`]) which are mapped onto theme roles ([`pixel_theme`]).
//! - **DOM**: the rendered page is flattened into a [`PageSnapshot`], reduced
//!   to color/font/logo signals ([`signals`]) and resolved into a theme with a
//!   confidence score ([`dom_theme`]).
//!
//! Pages are loaded through an [`Engine`] backend:
//!
//! - **Simple** (default): HTTP fetch, HTML parsing and a minimal stylesheet
//!   cascade; no JavaScript
//! - **CDP**: headless Chrome via the DevTools protocol
//!
//! # Example
//!
//! ```no_run
//! use themeshot::{EngineConfig, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig {
//!     viewport: Viewport { width: 1280, height: 720 },
//!     timeout_ms: 30000,
//!     ..Default::default()
//! };
//!
//! let report = themeshot::analyze_website_colors(config, "https://example.com")?;
//! println!("accent: {}", report.theme.theme.accent_color);
//! # Ok(())
//! # }
//! ```

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod color;
pub mod dom_theme;
pub mod page;
pub mod palette;
pub mod pixel_theme;
pub mod report;
pub mod selector;
pub mod signals;
pub mod theme;

pub use dom_theme::{synthesize_from_signals, DomTheme, DomThemeReport};
pub use page::PageSnapshot;
pub use palette::{extract_palette, rank_dominant_colors, simplify, Palette, SwatchRole};
pub use pixel_theme::{generate_ui_theme, synthesize_from_palette, PixelThemeReport};
pub use signals::{collect_signals, DomSignalSnapshot};
pub use theme::{ColorMood, Theme};

#[cfg(feature = "cdp")]
pub mod cdp;

// Browser-less engine: HTTP fetch + HTML parsing + minimal cascade
#[cfg(feature = "simple")]
pub mod simple;

// Estimated layout and painting for the simple engine
#[cfg(feature = "simple")]
pub mod rendering;

// Async-friendly browser API (worker-thread backed)
#[cfg(any(feature = "cdp", feature = "simple"))]
pub mod async_api;

#[cfg(any(feature = "cdp", feature = "simple"))]
pub use async_api::Browser;

/// Configuration for the page engines
///
/// The defaults mirror what the screenshot service has always used: a
/// 1280x720 viewport, a 30 second navigation budget and a sandbox-less
/// browser launch.
///
/// # Examples
///
/// ```
/// let cfg = themeshot::EngineConfig::default();
/// assert_eq!(cfg.timeout_ms, 30000);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Navigation budget in milliseconds
    pub timeout_ms: u64,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    /// Launch the browser with its sandbox enabled
    pub sandbox: bool,
    /// Extra wait after navigation so late requests can settle
    pub settle_ms: u64,
    /// Capture the full scrollable page instead of the viewport
    pub full_page: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Themeshot/0.1"
                .to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
            headers: HashMap::new(),
            sandbox: false,
            settle_ms: 500,
            full_page: true,
        }
    }
}

impl EngineConfig {
    /// Reject configurations no engine can honor.
    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::ConfigError("timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

/// A page session: navigate first, then read the rendered page.
pub trait Engine {
    /// Create a new engine instance with the given configuration
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and wait for the page to settle
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Flatten the current page into an immutable snapshot.
    ///
    /// Script-capable backends collect it with a read-only in-page function;
    /// a throw or malformed result is an [`Error::EvaluationError`].
    fn page_snapshot(&self) -> Result<PageSnapshot>;

    /// Render the current page as a PNG image
    fn render_png(&self) -> Result<Vec<u8>>;

    /// Close the engine and clean up resources
    fn close(self) -> Result<()>;
}

/// The backend picked by [`new_engine`].
#[cfg(feature = "cdp")]
pub type DefaultEngine = cdp::CdpEngine;

#[cfg(all(not(feature = "cdp"), feature = "simple"))]
pub type DefaultEngine = simple::SimpleEngine;

/// Create a new engine instance with the default backend
///
/// This prefers the CDP backend when the `cdp` feature is enabled, since it
/// renders pages for real. Otherwise the `SimpleEngine` is used.
#[cfg(any(feature = "cdp", feature = "simple"))]
pub fn new_engine(config: EngineConfig) -> Result<impl Engine> {
    DefaultEngine::new(config)
}

/// Run `f` against a fresh engine and close it on every exit path.
pub fn with_engine<E: Engine, T>(config: EngineConfig, f: impl FnOnce(&mut E) -> Result<T>) -> Result<T> {
    config.validate()?;
    let mut engine = E::new(config)?;
    let result = f(&mut engine);
    let closed = engine.close();
    if let Err(e) = &closed {
        warn!("Failed to close engine: {}", e);
    }
    let value = result?;
    closed?;
    Ok(value)
}

/// Load `url` in `engine` and run the DOM path on it.
pub fn analyze_page<E: Engine>(engine: &mut E, url: &str) -> Result<DomThemeReport> {
    engine.load_url(url)?;
    let page = engine.page_snapshot()?;
    Ok(DomThemeReport::new(collect_signals(&page)))
}

/// Load `url` in `engine`, screenshot it and run the pixel path.
pub fn screenshot_page<E: Engine>(engine: &mut E, url: &str) -> Result<PixelThemeReport> {
    engine.load_url(url)?;
    let png = engine.render_png()?;
    generate_ui_theme(&png)
}

/// DOM-path theme for `url` using the default engine.
#[cfg(any(feature = "cdp", feature = "simple"))]
pub fn analyze_website_colors(config: EngineConfig, url: &str) -> Result<DomThemeReport> {
    with_engine::<DefaultEngine, _>(config, |engine| analyze_page(engine, url))
}

/// Pixel-path theme for `url` using the default engine.
#[cfg(any(feature = "cdp", feature = "simple"))]
pub fn capture_theme(config: EngineConfig, url: &str) -> Result<PixelThemeReport> {
    with_engine::<DefaultEngine, _>(config, |engine| screenshot_page(engine, url))
}

/// PNG screenshot of `url` using the default engine.
#[cfg(any(feature = "cdp", feature = "simple"))]
pub fn capture_screenshot(config: EngineConfig, url: &str) -> Result<Vec<u8>> {
    with_engine::<DefaultEngine, _>(config, |engine| {
        engine.load_url(url)?;
        engine.render_png()
    })
}
