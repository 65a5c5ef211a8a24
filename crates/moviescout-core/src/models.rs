use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Shown to consumers whenever a list fetch fails, whatever the cause
pub const LOAD_ERROR_MESSAGE: &str = "Error loading movies";

/// Shown when a by-id lookup finds nothing in the local store
pub const NOT_FOUND_MESSAGE: &str = "Error no such movie";

/// Which TMDB list a movie was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Popular,
    Upcoming,
    TopRated,
    NowPlaying,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Popular,
        Category::Upcoming,
        Category::TopRated,
        Category::NowPlaying,
    ];

    /// The slug TMDB uses in `/movie/{slug}`, also the tag we store
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::Upcoming => "upcoming",
            Category::TopRated => "top_rated",
            Category::NowPlaying => "now_playing",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| crate::Error::InvalidCategory(s.to_string()))
    }
}

/// Movie model - what the rest of the app gets to see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    pub original_title: String,
    pub original_language: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub genre_ids: Vec<u32>,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: u32,
    pub adult: bool,
    pub video: bool,
    pub category: Category,
}

/// One step in the life of a fetch.
///
/// A fetch is observed as a sequence of these:
/// `Loading(true)`, then `Success` or `Error`, then `Loading(false)`.
/// A failed list fetch stops right after `Error`, so consumers have to treat
/// `Error` as the end of loading too (see [`FetchOutcome::ends_loading`]).
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Loading(bool),
    Success(T),
    Error(String),
}

impl<T> FetchOutcome<T> {
    /// True for anything that means "stop showing a spinner"
    pub fn ends_loading(&self) -> bool {
        matches!(self, FetchOutcome::Loading(false) | FetchOutcome::Error(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FetchOutcome::Error(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Loading(active) => FetchOutcome::Loading(active),
            FetchOutcome::Success(data) => FetchOutcome::Success(f(data)),
            FetchOutcome::Error(message) => FetchOutcome::Error(message),
        }
    }
}
