use moviescout_api::RemoteMovie;
use moviescout_cache::StoredMovieRecord;

use crate::{models::Category, Result};

/// Where fresh movie pages come from.
///
/// One call is one request; implementations must not retry on our behalf
/// unless they were configured to.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_page(&self, category: Category, page: u32) -> Result<Vec<RemoteMovie>>;
}

/// Local record store the fetch engine reads from and writes back to.
///
/// Implementations own their own concurrency safety; the store never locks
/// around these calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LocalStore: Send + Sync {
    async fn query_by_category(&self, category: Category) -> Result<Vec<StoredMovieRecord>>;

    async fn query_by_id(&self, id: u64) -> Result<Option<StoredMovieRecord>>;

    /// Insert-or-overwrite keyed by id
    async fn upsert_batch(&self, records: &[StoredMovieRecord]) -> Result<()>;
}
