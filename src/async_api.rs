use crate::page::PageSnapshot;
use crate::{
    collect_signals, generate_ui_theme, DefaultEngine, DomThemeReport, Engine, EngineConfig, Error, PixelThemeReport,
    Result,
};
use log::warn;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Goto(String, oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<Result<PageSnapshot>>),
    Screenshot(Option<String>, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly browser abstraction backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous engine (see [`crate::new_engine`]) and
/// executes commands sent from async tasks so callers can use an async
/// interface without requiring the engine to be `Send` across threads.
#[derive(Clone)]
pub struct Browser {
    cmd_tx: Sender<Command>,
}

/// A handle representing a page/context in the browser.
#[derive(Clone)]
pub struct Page {
    cmd_tx: Sender<Command>,
}

async fn request<T>(rx: oneshot::Receiver<Result<T>>, what: &str) -> Result<T> {
    rx.await
        .map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))?
}

impl Browser {
    /// Create a new browser (spawns a background thread that owns the engine).
    pub async fn new(config: Option<EngineConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize engine on the worker thread
            let mut engine = match DefaultEngine::new(config) {
                Ok(e) => e,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Goto(url, resp) => {
                        let _ = resp.send(engine.load_url(&url));
                    }
                    Command::Snapshot(resp) => {
                        let _ = resp.send(engine.page_snapshot());
                    }
                    Command::Screenshot(path_opt, resp) => {
                        // If a path is provided, also write to disk
                        let res = engine.render_png().and_then(|data| {
                            if let Some(path) = path_opt {
                                std::fs::write(&path, &data)
                                    .map_err(|e| Error::Other(format!("Failed to write {}: {}", path, e)))?;
                            }
                            Ok(data)
                        });
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(engine.close());
                        return;
                    }
                }
            }

            // Every handle was dropped without an explicit close
            if let Err(e) = engine.close() {
                warn!("Failed to close engine: {}", e);
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Open a new page handle backed by the same worker thread.
    pub async fn new_page(&self) -> Result<Page> {
        Ok(Page {
            cmd_tx: self.cmd_tx.clone(),
        })
    }

    /// Shutdown the background worker and close the browser.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        request(rx, "Close").await
    }
}

impl Page {
    /// Navigate to a URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Goto(url.to_string(), tx));
        request(rx, "Goto").await
    }

    /// Flatten the current page into a [`PageSnapshot`].
    pub async fn snapshot(&self) -> Result<PageSnapshot> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Snapshot(tx));
        request(rx, "Snapshot").await
    }

    /// Take a screenshot; if `path` is Some, the bytes will also be saved to that path.
    pub async fn screenshot(&self, path: Option<&str>) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Screenshot(path.map(|s| s.to_string()), tx));
        request(rx, "Screenshot").await
    }
}

/// Run the pixel path over image bytes on the blocking pool.
pub async fn analyze_screenshot(bytes: Vec<u8>) -> Result<PixelThemeReport> {
    tokio::task::spawn_blocking(move || generate_ui_theme(&bytes))
        .await
        .map_err(|e| Error::Other(format!("Palette task failed: {}", e)))?
}

/// Load `url` in a fresh browser and run `f` on the page, closing the
/// browser on every exit path.
async fn with_page<T, F, Fut>(config: EngineConfig, url: &str, f: F) -> Result<T>
where
    F: FnOnce(Page) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let browser = Browser::new(Some(config)).await?;
    let result = async {
        let page = browser.new_page().await?;
        page.goto(url).await?;
        f(page).await
    }
    .await;
    let closed = browser.close().await;
    if let Err(e) = &closed {
        warn!("Failed to close browser: {}", e);
    }
    let value = result?;
    closed?;
    Ok(value)
}

/// DOM-path theme for `url`.
pub async fn analyze_website(config: EngineConfig, url: &str) -> Result<DomThemeReport> {
    let snapshot = with_page(config, url, |page| async move { page.snapshot().await }).await?;
    Ok(DomThemeReport::new(collect_signals(&snapshot)))
}

/// Pixel-path theme for `url`: screenshot first, then palette extraction.
pub async fn capture_website_theme(config: EngineConfig, url: &str) -> Result<PixelThemeReport> {
    let png = with_page(config, url, |page| async move { page.screenshot(None).await }).await?;
    analyze_screenshot(png).await
}
