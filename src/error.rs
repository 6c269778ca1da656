//! Error types for the launcher plugin
//!
//! All externally-facing operations funnel their failures into
//! [`LauncherError`]. Variants wrap the underlying error with `#[source]`
//! so the full chain survives into the log output. Action handlers follow
//! a catch-log-continue policy: errors are logged and surfaced to the user
//! only as an alert flash on the pressed key.

use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for launcher operations
#[derive(Debug, Error)]
pub enum LauncherError {
    /// Process enumeration, spawn or termination failed
    #[error("Process control error: {0}")]
    ProcessControl(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The configured application path does not exist
    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    /// Steam VDF/ACF parsing failed
    #[error("VDF parse error: {0}")]
    Vdf(#[from] crate::steam::vdf::VdfError),

    /// Epic catalog/manifest resolution failed
    #[error("Epic catalog error: {0}")]
    EpicCatalog(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Failed to enumerate or launch UWP packages
    #[error("UWP error: {0}")]
    Uwp(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Key-image compositing or encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Store API or image download failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Logging initialization failed
    #[error("Logging error: {0}")]
    Logging(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, LauncherError>;
