// SQLite-backed LocalStore. rusqlite is blocking, so every call hops onto the
// blocking pool.
use std::sync::Arc;

use async_trait::async_trait;
use moviescout_cache::{MovieCache, StoredMovieRecord};

use crate::{models::Category, source::LocalStore, Error, Result};

#[derive(Clone)]
pub struct SqliteStore {
    cache: Arc<MovieCache>,
}

impl SqliteStore {
    pub fn new(cache: MovieCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Open the cache file at `db_path`
    pub fn open(db_path: &str) -> Result<Self> {
        let cache = MovieCache::new(db_path).map_err(|e| Error::CacheError(e.to_string()))?;
        Ok(Self::new(cache))
    }

    pub fn cache(&self) -> &MovieCache {
        &self.cache
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&MovieCache) -> moviescout_cache::Result<T> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || op(cache.as_ref()))
            .await
            .map_err(|e| Error::Unknown(format!("cache task failed: {}", e)))?
            .map_err(|e| Error::CacheError(e.to_string()))
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn query_by_category(&self, category: Category) -> Result<Vec<StoredMovieRecord>> {
        self.run(move |cache| cache.get_by_category(category.as_str()))
            .await
    }

    async fn query_by_id(&self, id: u64) -> Result<Option<StoredMovieRecord>> {
        self.run(move |cache| cache.get_by_id(id)).await
    }

    async fn upsert_batch(&self, records: &[StoredMovieRecord]) -> Result<()> {
        let records = records.to_vec();
        self.run(move |cache| cache.upsert_batch(&records)).await
    }
}
