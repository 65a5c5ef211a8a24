use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use moviescout_api::RemoteMovie;
use moviescout_cache::MovieCache;
use moviescout_core::{
    mappers::remote_to_record, Category, Error, LocalStore, MovieListStateMachine,
    MovieListStore, MovieListUiEvent, RemoteSource, SqliteStore, ViewState,
};
use tokio::sync::{watch, Notify};
use tokio::time::timeout;

const PAGE_SIZE: u64 = 4;

/// Deterministic TMDB stand-in: page N of a list holds PAGE_SIZE movies with
/// ids derived from the list and page, so every page is distinct.
#[derive(Default)]
struct FakeRemote {
    calls: Mutex<Vec<(Category, u32)>>,
    failing: AtomicBool,
    stall_next: AtomicBool,
    gate: Notify,
}

impl FakeRemote {
    fn calls(&self) -> Vec<(Category, u32)> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, category: Category) -> usize {
        self.calls().iter().filter(|(c, _)| *c == category).count()
    }
}

fn movie_ids(category: Category, page: u32) -> Vec<u64> {
    let base = match category {
        Category::Popular => 10_000,
        Category::Upcoming => 20_000,
        _ => 30_000,
    };
    (0..PAGE_SIZE)
        .map(|i| base + u64::from(page) * 100 + i)
        .collect()
}

fn remote_movie(id: u64) -> RemoteMovie {
    RemoteMovie {
        id,
        title: format!("Movie {}", id),
        ..RemoteMovie::default()
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn fetch_page(
        &self,
        category: Category,
        page: u32,
    ) -> moviescout_core::Result<Vec<RemoteMovie>> {
        self.calls.lock().unwrap().push((category, page));

        if self.stall_next.swap(false, Ordering::SeqCst) {
            self.gate.notified().await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::ApiError("network unreachable".into()));
        }

        Ok(movie_ids(category, page).into_iter().map(remote_movie).collect())
    }
}

fn setup(remote: Arc<FakeRemote>) -> (MovieListStore, SqliteStore) {
    let local = SqliteStore::new(MovieCache::in_memory().unwrap());
    let store = MovieListStore::new(remote, Arc::new(local.clone()));
    (store, local)
}

async fn settle<F>(rx: &mut watch::Receiver<ViewState>, done: F) -> ViewState
where
    F: FnMut(&ViewState) -> bool,
{
    let state = timeout(Duration::from_secs(5), rx.wait_for(done))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
    (*state).clone()
}

async fn wait_for_calls(remote: &FakeRemote, category: Category, count: usize) {
    timeout(Duration::from_secs(5), async {
        while remote.calls_for(category) < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("timed out waiting for remote calls");
}

fn sorted_ids(state: &ViewState, category: Category) -> Vec<u64> {
    let mut ids: Vec<u64> = state.movies(category).iter().map(|m| m.id).collect();
    ids.sort_unstable();
    ids
}

fn both_first_pages_loaded(state: &ViewState) -> bool {
    state.popular_page == 2 && state.upcoming_page == 2 && !state.is_loading
}

#[tokio::test]
async fn test_initial_load_fetches_both_lists() {
    let remote = Arc::new(FakeRemote::default());
    let (store, local) = setup(remote.clone());

    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();
    let state = settle(&mut rx, both_first_pages_loaded).await;

    assert_eq!(sorted_ids(&state, Category::Popular), movie_ids(Category::Popular, 1));
    assert_eq!(sorted_ids(&state, Category::Upcoming), movie_ids(Category::Upcoming, 1));
    assert!(state.popular_movies.iter().all(|m| m.category == Category::Popular));

    let mut calls = remote.calls();
    calls.sort_by_key(|(c, p)| (c.as_str(), *p));
    assert_eq!(calls, vec![(Category::Popular, 1), (Category::Upcoming, 1)]);

    // Both pages were written back
    let cached = local.query_by_category(Category::Upcoming).await.unwrap();
    assert_eq!(cached.len() as u64, PAGE_SIZE);
}

#[tokio::test]
async fn test_initial_load_prefers_cache() {
    let remote = Arc::new(FakeRemote::default());
    let (store, local) = setup(remote.clone());

    let cached: Vec<_> = [1, 2, 3]
        .into_iter()
        .map(|id| remote_to_record(remote_movie(id), Category::Popular))
        .collect();
    local.upsert_batch(&cached).await.unwrap();

    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();
    let state = settle(&mut rx, both_first_pages_loaded).await;

    assert_eq!(sorted_ids(&state, Category::Popular), vec![1, 2, 3]);
    assert_eq!(remote.calls_for(Category::Popular), 0);
    assert_eq!(remote.calls_for(Category::Upcoming), 1);
}

#[tokio::test]
async fn test_paginate_appends_pages_and_advances_cursor() {
    let remote = Arc::new(FakeRemote::default());
    let (store, _local) = setup(remote.clone());

    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();
    settle(&mut rx, both_first_pages_loaded).await;

    let pages = 3;
    for n in 1..=pages {
        machine.handle_event(MovieListUiEvent::Paginate(Category::Popular));
        settle(&mut rx, |s| s.popular_page == 2 + n && !s.is_loading).await;
    }

    let state = machine.snapshot();
    assert_eq!(state.popular_page, 2 + pages);
    assert_eq!(state.popular_movies.len() as u64, PAGE_SIZE * u64::from(1 + pages));

    let mut expected: Vec<u64> = (1..=1 + pages)
        .flat_map(|page| movie_ids(Category::Popular, page))
        .collect();
    expected.sort_unstable();
    assert_eq!(sorted_ids(&state, Category::Popular), expected);

    // Upcoming was left alone
    assert_eq!(state.upcoming_page, 2);
    assert_eq!(remote.calls_for(Category::Upcoming), 1);
}

#[tokio::test]
async fn test_navigate_toggles_focus() {
    let remote = Arc::new(FakeRemote::default());
    let (store, _local) = setup(remote);

    let machine = MovieListStateMachine::new(store);
    assert!(machine.snapshot().is_current_popular_screen);

    machine.handle_event(MovieListUiEvent::Navigate);
    assert!(!machine.snapshot().is_current_popular_screen);

    machine.handle_event(MovieListUiEvent::Navigate);
    assert!(machine.snapshot().is_current_popular_screen);
}

#[tokio::test]
async fn test_remote_failure_clears_loading_and_keeps_data() {
    let remote = Arc::new(FakeRemote::default());
    let (store, _local) = setup(remote.clone());

    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();
    let before = settle(&mut rx, both_first_pages_loaded).await;

    remote.failing.store(true, Ordering::SeqCst);
    machine.handle_event(MovieListUiEvent::Paginate(Category::Upcoming));
    assert!(machine.snapshot().is_loading);
    wait_for_calls(&remote, Category::Upcoming, 2).await;

    let after = settle(&mut rx, |s| !s.is_loading).await;
    assert_eq!(after.upcoming_movies, before.upcoming_movies);
    assert_eq!(after.upcoming_page, 2);
    assert_eq!(remote.calls_for(Category::Upcoming), 2);
}

#[tokio::test]
async fn test_failed_initial_load_leaves_empty_lists() {
    let remote = Arc::new(FakeRemote::default());
    remote.failing.store(true, Ordering::SeqCst);
    let (store, _local) = setup(remote.clone());

    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();

    wait_for_calls(&remote, Category::Popular, 1).await;
    wait_for_calls(&remote, Category::Upcoming, 1).await;

    let state = settle(&mut rx, |s| !s.is_loading).await;
    assert!(state.popular_movies.is_empty());
    assert!(state.upcoming_movies.is_empty());
    assert_eq!(state.popular_page, 1);
    assert_eq!(state.upcoming_page, 1);
}

#[tokio::test]
async fn test_newer_paginate_replaces_pending_one() {
    let remote = Arc::new(FakeRemote::default());
    let (store, _local) = setup(remote.clone());

    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();
    settle(&mut rx, both_first_pages_loaded).await;

    // First paginate hangs inside the remote call
    remote.stall_next.store(true, Ordering::SeqCst);
    machine.handle_event(MovieListUiEvent::Paginate(Category::Popular));
    wait_for_calls(&remote, Category::Popular, 2).await;

    // Second one goes through and wins
    machine.handle_event(MovieListUiEvent::Paginate(Category::Popular));
    let state = settle(&mut rx, |s| s.popular_page == 3 && !s.is_loading).await;

    // Let the stalled call go; its results must never land
    remote.gate.notify_waiters();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let settled = machine.snapshot();
    assert_eq!(settled.popular_page, 3);
    assert_eq!(settled.popular_movies.len(), state.popular_movies.len());
    assert_eq!(settled.popular_movies.len() as u64, PAGE_SIZE * 2);

    let distinct: HashSet<u64> = settled.popular_movies.iter().map(|m| m.id).collect();
    assert_eq!(distinct.len(), settled.popular_movies.len());
}

#[tokio::test]
async fn test_paginate_on_untracked_list_is_noop() {
    let remote = Arc::new(FakeRemote::default());
    let (store, _local) = setup(remote.clone());

    let machine = MovieListStateMachine::new(store);
    let mut rx = machine.subscribe();
    let before = settle(&mut rx, both_first_pages_loaded).await;

    machine.handle_event(MovieListUiEvent::Paginate(Category::TopRated));

    assert_eq!(machine.snapshot(), before);
    assert_eq!(remote.calls_for(Category::TopRated), 0);
}
