//! Error types for theme extraction and the page engines

use thiserror::Error;

/// Result type alias for engine and extraction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing a page or extracting its theme
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize the engine
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// The page did not settle within the navigation budget
    #[error("Navigation timed out after {0}ms")]
    NavigationTimeout(u64),

    /// The image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// The in-page collector threw or returned malformed data
    #[error("Page evaluation failed: {0}")]
    EvaluationError(String),

    /// Failed to render content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::DecodeError(err.to_string())
    }
}
