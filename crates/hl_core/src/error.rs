use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Interaction failures that end a pagination run early without failing it.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ClickIntercepted(_) | Error::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
