//! Error types shared by the viewer components

use thiserror::Error;

/// Failure reported by the host environment (DOM, GPU context, observers)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised while constructing a viewer instance
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Renderer unavailable: {0}")]
    Renderer(PlatformError),
    #[error("Failed to attach to host element: {0}")]
    Attach(PlatformError),
    #[error("Failed to observe host size: {0}")]
    Observe(PlatformError),
    #[error("Failed to build toolbar: {0}")]
    Toolbar(PlatformError),
}

/// Errors delivered by a mesh load
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("No mesh source configured")]
    MissingSource,
    #[error("Fetch failed: {0}")]
    Network(String),
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },
    #[error("Mesh parse error: {0}")]
    Parse(String),
    #[error("Mesh has no finite vertices")]
    EmptyGeometry,
}

/// Errors raised while reading viewer configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
