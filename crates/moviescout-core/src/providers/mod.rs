// Adapters that plug the api and cache crates into the store's traits
pub mod sqlite;
pub mod tmdb;

pub use sqlite::SqliteStore;
pub use tmdb::TmdbProvider;
