use base64::Engine as Base64Engine;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{error, info};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use themeshot::async_api::{analyze_screenshot, analyze_website, capture_website_theme, Browser};
use themeshot::palette::{extract_color_palette, simplify};
use themeshot::report::Outcome;
use themeshot::{EngineConfig, Error, Result, Viewport};

#[derive(Parser, Debug)]
#[command(name = "themeshot", version, about = "Website screenshots and brand theme extraction")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Viewport width in CSS pixels
    #[arg(long, global = true, default_value_t = 1280)]
    width: u32,

    /// Viewport height in CSS pixels
    #[arg(long, global = true, default_value_t = 720)]
    height: u32,

    /// Navigation budget in milliseconds
    #[arg(long, global = true, default_value_t = 30000)]
    timeout_ms: u64,

    /// Override the user agent
    #[arg(long, global = true)]
    user_agent: Option<String>,
}

impl EngineArgs {
    fn config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            viewport: Viewport {
                width: self.width,
                height: self.height,
            },
            timeout_ms: self.timeout_ms,
            ..Default::default()
        };
        if let Some(ua) = &self.user_agent {
            config.user_agent = ua.clone();
        }
        config
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ThemeSource {
    /// Computed styles of the rendered page
    Dom,
    /// Palette of a full-page screenshot
    Pixels,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a PNG screenshot of a page
    Screenshot {
        url: String,
        /// Write the PNG here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print a base64 `data:` URL instead of raw bytes
        #[arg(long, conflicts_with = "out")]
        data_url: bool,
    },
    /// Extract the six-swatch palette of an image file
    Palette {
        image: PathBuf,
        /// Only role names, hex values and the population ranking
        #[arg(long)]
        simple: bool,
    },
    /// Extract a UI theme from a live page
    Theme {
        url: String,
        #[arg(long, value_enum, default_value_t = ThemeSource::Dom)]
        from: ThemeSource,
    },
    /// Extract a UI theme from an image file
    ThemeImage { image: PathBuf },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedScreenshot {
    path: PathBuf,
    bytes: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineScreenshot {
    screenshot: String,
}

fn read_image(path: &PathBuf) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::LoadError(format!("Failed to read {}: {}", path.display(), e)))
}

async fn screenshot(config: EngineConfig, url: &str) -> Result<Vec<u8>> {
    let browser = Browser::new(Some(config)).await?;
    let page = browser.new_page().await?;
    let result = match page.goto(url).await {
        Ok(()) => page.screenshot(None).await,
        Err(e) => Err(e),
    };
    let closed = browser.close().await;
    let png = result?;
    closed?;
    Ok(png)
}

/// Print `outcome` as JSON and report whether it succeeded.
fn emit<T: Serialize>(outcome: Outcome<T>) -> bool {
    let ok = outcome.is_success();
    if let Outcome::Failure(message) = &outcome {
        error!("{}", message);
    }
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            return false;
        }
    }
    ok
}

async fn run(cli: Cli) -> bool {
    let config = cli.engine.config();
    match cli.command {
        Command::Screenshot { url, out, data_url } => {
            info!("Capturing {}", url);
            let png = screenshot(config, &url).await;
            if let Some(path) = out {
                let saved = png.and_then(|data| {
                    std::fs::write(&path, &data)
                        .map_err(|e| Error::Other(format!("Failed to write {}: {}", path.display(), e)))?;
                    Ok(SavedScreenshot { path, bytes: data.len() })
                });
                emit(Outcome::from(saved))
            } else if data_url {
                let inline = png.map(|data| InlineScreenshot {
                    screenshot: format!(
                        "data:image/png;base64,{}",
                        base64::engine::general_purpose::STANDARD.encode(&data)
                    ),
                });
                emit(Outcome::from(inline))
            } else {
                match png {
                    Ok(data) => std::io::stdout().write_all(&data).is_ok(),
                    Err(e) => emit(Outcome::<()>::Failure(e.to_string())),
                }
            }
        }
        Command::Palette { image, simple } => {
            let report = read_image(&image).and_then(|bytes| extract_color_palette(&bytes));
            if simple {
                emit(Outcome::from(report.map(|r| simplify(&r.palette))))
            } else {
                emit(Outcome::from(report))
            }
        }
        Command::Theme { url, from } => {
            info!("Extracting theme from {} ({:?})", url, from);
            match from {
                ThemeSource::Dom => emit(Outcome::from(analyze_website(config, &url).await)),
                ThemeSource::Pixels => emit(Outcome::from(capture_website_theme(config, &url).await)),
            }
        }
        Command::ThemeImage { image } => {
            let report = match read_image(&image) {
                Ok(bytes) => analyze_screenshot(bytes).await,
                Err(e) => Err(e),
            };
            emit(Outcome::from(report))
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if !run(cli).await {
        std::process::exit(1);
    }
}
