// TMDB provider - bridges the API client with the RemoteSource trait
use async_trait::async_trait;
use moviescout_api::{RemoteMovie, RetryConfig, TmdbClient};
use tracing::debug;

use crate::{config::ApiConfig, models::Category, source::RemoteSource, Error, Result};

/// Wrapper around TmdbClient that implements RemoteSource
pub struct TmdbProvider {
    client: TmdbClient,
}

impl TmdbProvider {
    pub fn new(client: TmdbClient) -> Self {
        Self { client }
    }

    /// Build the client from the `[api]` config section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = TmdbClient::with_base_url(config.api_key.clone(), config.base_url.clone())
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?
            .with_retry_config(RetryConfig::with_max_retries(config.max_retries));

        Ok(Self::new(client))
    }
}

#[async_trait]
impl RemoteSource for TmdbProvider {
    async fn fetch_page(&self, category: Category, page: u32) -> Result<Vec<RemoteMovie>> {
        let list = self
            .client
            .get_movie_list(category.as_str(), page)
            .await
            .map_err(|e| Error::ApiError(e.to_string()))?;

        debug!(
            "TMDB {} page {}/{} returned {} movies",
            category,
            list.page,
            list.total_pages,
            list.results.len()
        );
        Ok(list.results)
    }
}
