use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache lock poisoned")]
    Poisoned,

    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: u64, reason: String },
}

pub type Result<T> = std::result::Result<T, CacheError>;
