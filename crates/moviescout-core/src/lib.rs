// Core business logic lives here - the cache-aside store and the list state machine
pub mod config;
pub mod error;
pub mod mappers;
pub mod models;
pub mod providers;
pub mod source;
pub mod state;
pub mod state_machine;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use models::{Category, FetchOutcome, Movie};
pub use providers::{SqliteStore, TmdbProvider};
pub use source::{LocalStore, RemoteSource};
pub use state::{MovieListUiEvent, ViewState};
pub use state_machine::MovieListStateMachine;
pub use store::MovieListStore;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
