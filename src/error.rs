use thiserror::Error;

#[derive(Error, Debug)]
pub enum HuntError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration Error: {0}")]
    Config(String),
}

pub type HuntResult<T> = Result<T, HuntError>;
