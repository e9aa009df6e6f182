use thiserror::Error;

#[derive(Error, Debug)]
pub enum SanityError {
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Env file error: {0}")]
    EnvFile(#[from] std::io::Error),

    #[error("Ingest rejected: {0}")]
    IngestRejected(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for SanityError {
    fn from(e: serde_json::Error) -> Self {
        SanityError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SanityError>;
