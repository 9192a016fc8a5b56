use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImeiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Check digit input must be exactly 14 decimal digits, got {0:?}")]
    InvalidLength(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing API key: pass --api-key or run `imei-resolver key set <KEY>`")]
    MissingApiKey,

    #[error("No identifiers supplied")]
    NoInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ImeiError>;
