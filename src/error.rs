use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// An expected block or pattern is absent from the input text.
    #[error("Structure not found: {0}")]
    StructureNotFound(String),

    #[error("Anchor not found: {0}")]
    AnchorNotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    /// Whether the error means "cannot analyze" rather than a hard failure.
    pub fn is_degraded(&self) -> bool {
        matches!(self, AppError::StructureNotFound(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Manifest(err.to_string())
    }
}

impl From<ureq::Error> for AppError {
    fn from(err: ureq::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
