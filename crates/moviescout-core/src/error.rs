use thiserror::Error;

/// All the ways things can go wrong below the fetch streams
///
/// None of these reach a stream consumer directly: the store logs them and
/// emits a generic `FetchOutcome::Error` instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Cache operation failed: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown movie category: {0}")]
    InvalidCategory(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}
