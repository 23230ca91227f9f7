use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates failures raised while reading, editing or persisting config sections.
pub enum ConfigError {
    #[error("key not found: {path}")]
    KeyNotFound { path: String },
    #[error("failed to load config section '{section}': {reason}")]
    ConfigLoad { section: String, reason: String },
    #[error("unknown config section '{0}'")]
    UnknownSection(String),
    #[error("invalid config section name '{0}'")]
    InvalidSectionName(String),
    #[error("config section '{section}' is not a JSON object")]
    NotAnObject { section: String },
    #[error("invalid authorization token")]
    InvalidToken,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("config store returned non-success status {status} for {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
