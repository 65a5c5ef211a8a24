use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::retry::{is_retryable_status, with_retry, RetryConfig};

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";

#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("API request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Movie list not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("No TMDB API key configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl TmdbError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TmdbError::RateLimitExceeded => true,
            TmdbError::RequestFailed { status, .. } => reqwest::StatusCode::from_u16(*status)
                .map(is_retryable_status)
                .unwrap_or(false),
            TmdbError::NetworkError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TmdbError>;

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    retry_config: RetryConfig,
}

impl TmdbClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(api_key, TMDB_API_BASE.to_string())
    }

    /// Point the client somewhere else (a proxy, or a local stub in tests)
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("MovieScout/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_config: RetryConfig::default(),
        })
    }

    /// Swap in a custom retry configuration
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a movie list endpoint, e.g. `/movie/popular`
    pub fn list_url(&self, category: &str) -> String {
        format!("{}/movie/{}", self.base_url, category)
    }

    /// Fetch one page of a movie list (`popular`, `upcoming`, `top_rated`, ...)
    pub async fn get_movie_list(&self, category: &str, page: u32) -> Result<MovieListPage> {
        let api_key = self.api_key.as_deref().ok_or(TmdbError::MissingApiKey)?;
        let url = self.list_url(category);
        let page = page.to_string();

        debug!("GET {} page={}", url, page);

        with_retry(&self.retry_config, TmdbError::is_retryable, || async {
            let response = self
                .client
                .get(&url)
                .query(&[("page", page.as_str()), ("api_key", api_key)])
                .send()
                .await?;

            let status = response.status();

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(TmdbError::NotFound(category.to_string()));
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(TmdbError::AuthRequired);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(TmdbError::RateLimitExceeded);
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TmdbError::RequestFailed {
                    status: status.as_u16(),
                    body,
                });
            }

            // Read the body first so a schema mismatch surfaces as a ParseError
            let body = response.text().await?;
            let list: MovieListPage = serde_json::from_str(&body)?;
            Ok(list)
        })
        .await
    }
}

/// One page of a TMDB movie list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieListPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<RemoteMovie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// A movie as TMDB sends it. TMDB happily returns nulls, hence all the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub video: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"{
        "page": 1,
        "results": [
            {
                "adult": false,
                "backdrop_path": "/bd.jpg",
                "genre_ids": [28, 12],
                "id": 872585,
                "original_language": "en",
                "original_title": "Oppenheimer",
                "overview": "The story of J. Robert Oppenheimer.",
                "popularity": 512.3,
                "poster_path": "/poster.jpg",
                "release_date": "2023-07-19",
                "title": "Oppenheimer",
                "video": false,
                "vote_average": 8.1,
                "vote_count": 9000
            },
            {
                "id": 42,
                "title": "Sparse",
                "poster_path": null,
                "release_date": null
            }
        ],
        "total_pages": 500,
        "total_results": 10000
    }"#;

    #[test]
    fn test_parse_movie_list_page() {
        let page: MovieListPage = serde_json::from_str(SAMPLE_PAGE).unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 500);
        assert_eq!(page.results.len(), 2);

        let first = &page.results[0];
        assert_eq!(first.id, 872585);
        assert_eq!(first.genre_ids, vec![28, 12]);
        assert_eq!(first.release_date.as_deref(), Some("2023-07-19"));
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        let page: MovieListPage = serde_json::from_str(SAMPLE_PAGE).unwrap();
        let sparse = &page.results[1];

        assert_eq!(sparse.title, "Sparse");
        assert!(sparse.poster_path.is_none());
        assert!(sparse.genre_ids.is_empty());
        assert_eq!(sparse.vote_count, 0);
    }

    #[test]
    fn test_list_url_strips_trailing_slash() {
        let client =
            TmdbClient::with_base_url(None, "http://localhost:8080/3/".to_string()).unwrap();
        assert_eq!(
            client.list_url("upcoming"),
            "http://localhost:8080/3/movie/upcoming"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let client = TmdbClient::new(None).unwrap();
        let result = client.get_movie_list("popular", 1).await;
        assert!(matches!(result, Err(TmdbError::MissingApiKey)));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(TmdbError::RateLimitExceeded.is_retryable());
        assert!(TmdbError::RequestFailed {
            status: 503,
            body: String::new()
        }
        .is_retryable());

        assert!(!TmdbError::AuthRequired.is_retryable());
        assert!(!TmdbError::NotFound("popular".into()).is_retryable());
        assert!(!TmdbError::RequestFailed {
            status: 400,
            body: String::new()
        }
        .is_retryable());
    }
}
