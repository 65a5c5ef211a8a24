// Cache-aside movie list store: local first, remote on miss, write back
use std::sync::Arc;

use async_stream::stream;
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    mappers::{record_to_movie, remote_to_record},
    models::{Category, FetchOutcome, Movie, LOAD_ERROR_MESSAGE, NOT_FOUND_MESSAGE},
    source::{LocalStore, RemoteSource},
};

/// Fetch engine that checks the local store before hitting the API
///
/// Every operation returns a stream of [`FetchOutcome`]s instead of a single
/// value, so a consumer can drive a loading indicator separately from the
/// data. Faults never escape the stream; they come out as
/// `FetchOutcome::Error`.
#[derive(Clone)]
pub struct MovieListStore {
    remote: Arc<dyn RemoteSource>,
    local: Arc<dyn LocalStore>,
}

impl MovieListStore {
    pub fn new(remote: Arc<dyn RemoteSource>, local: Arc<dyn LocalStore>) -> Self {
        Self { remote, local }
    }

    /// Fetch one list page, cache-aside.
    ///
    /// With a non-empty local set and `force_remote == false` this returns the
    /// *whole* cached category and ignores `page`. Callers paginating past the
    /// first page are expected to pass `force_remote = true`.
    ///
    /// On a remote or storage fault the stream ends with `Error` and no
    /// trailing `Loading(false)`.
    pub fn fetch_list(
        &self,
        force_remote: bool,
        category: Category,
        page: u32,
    ) -> BoxStream<'static, FetchOutcome<Vec<Movie>>> {
        let remote = Arc::clone(&self.remote);
        let local = Arc::clone(&self.local);

        stream! {
            yield FetchOutcome::Loading(true);

            let cached = match local.query_by_category(category).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Cache read for {} failed: {}", category, e);
                    yield FetchOutcome::Error(LOAD_ERROR_MESSAGE.to_string());
                    return;
                }
            };

            if !cached.is_empty() && !force_remote {
                info!("Cache hit! {} {} movies", cached.len(), category);
                yield FetchOutcome::Success(
                    cached
                        .into_iter()
                        .map(|record| record_to_movie(record, category))
                        .collect(),
                );
                yield FetchOutcome::Loading(false);
                return;
            }

            debug!(
                "Fetching {} page {} from remote (cached: {}, forced: {})",
                category,
                page,
                cached.len(),
                force_remote
            );

            let fetched = match remote.fetch_page(category, page).await {
                Ok(movies) => movies,
                Err(e) => {
                    warn!("Remote fetch for {} page {} failed: {}", category, page, e);
                    yield FetchOutcome::Error(LOAD_ERROR_MESSAGE.to_string());
                    return;
                }
            };

            let records: Vec<_> = fetched
                .into_iter()
                .map(|movie| remote_to_record(movie, category))
                .collect();

            if let Err(e) = local.upsert_batch(&records).await {
                warn!("Failed to cache {} {} movies: {}", records.len(), category, e);
                yield FetchOutcome::Error(LOAD_ERROR_MESSAGE.to_string());
                return;
            }
            info!("Cached {} {} movies from page {}", records.len(), category, page);

            yield FetchOutcome::Success(
                records
                    .into_iter()
                    .map(|record| record_to_movie(record, category))
                    .collect(),
            );
            yield FetchOutcome::Loading(false);
        }
        .boxed()
    }

    /// Look a movie up in the local store. Never touches the network.
    pub fn fetch_by_id(&self, id: u64) -> BoxStream<'static, FetchOutcome<Movie>> {
        let local = Arc::clone(&self.local);

        stream! {
            yield FetchOutcome::Loading(true);

            let record = match local.query_by_id(id).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("Cache lookup for movie {} failed: {}", id, e);
                    yield FetchOutcome::Error(LOAD_ERROR_MESSAGE.to_string());
                    return;
                }
            };

            match record {
                Some(record) => match record.category.parse::<Category>() {
                    Ok(category) => {
                        yield FetchOutcome::Success(record_to_movie(record, category));
                        yield FetchOutcome::Loading(false);
                    }
                    Err(e) => {
                        warn!("Movie {} has a bad category tag: {}", id, e);
                        yield FetchOutcome::Error(LOAD_ERROR_MESSAGE.to_string());
                    }
                },
                None => {
                    debug!("Movie {} not in cache", id);
                    yield FetchOutcome::Error(NOT_FOUND_MESSAGE.to_string());
                    yield FetchOutcome::Loading(false);
                }
            }
        }
        .boxed()
    }
}
