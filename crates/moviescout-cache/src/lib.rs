// SQLite-backed movie store
// Keeps API calls down and makes offline browsing possible

pub mod cache;
pub mod error;

pub use cache::{MovieCache, StoredMovieRecord};
pub use error::{CacheError, Result};
