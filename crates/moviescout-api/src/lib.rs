// API client for the TMDB movie list endpoints
pub mod retry;
pub mod tmdb;

// Re-export common types
pub use retry::RetryConfig;
pub use tmdb::{MovieListPage, RemoteMovie, TmdbClient, TmdbError};
