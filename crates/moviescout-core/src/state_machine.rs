// Drives the popular and upcoming lists through the store and keeps the
// merged view state
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use rand::seq::SliceRandom;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    models::{Category, FetchOutcome, Movie},
    state::{MovieListUiEvent, ViewState},
    store::MovieListStore,
};

/// One cancellable load per list.
///
/// Starting a load bumps `generation` and aborts whatever task was running.
/// An emission only lands if its generation is still current when the state
/// update runs, so a late result from a replaced load is dropped.
#[derive(Default)]
struct LoadSlot {
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LoadSlot {
    fn replace_task(&self, task: JoinHandle<()>) {
        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn abort(&self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

/// View-state reducer for the movie list screens
///
/// Owns a single [`ViewState`] behind a watch channel. Every change goes
/// through one `send_if_modified` call, so no observer ever sees a half
/// applied update. Must be created inside a tokio runtime; loads run on that
/// runtime.
pub struct MovieListStateMachine {
    store: MovieListStore,
    state: Arc<watch::Sender<ViewState>>,
    popular: LoadSlot,
    upcoming: LoadSlot,
    runtime: Handle,
}

impl MovieListStateMachine {
    /// Build the state machine and kick off the first load of both lists
    pub fn new(store: MovieListStore) -> Self {
        let (state, _) = watch::channel(ViewState::default());

        let machine = Self {
            store,
            state: Arc::new(state),
            popular: LoadSlot::default(),
            upcoming: LoadSlot::default(),
            runtime: Handle::current(),
        };

        machine.load_category(Category::Popular, false);
        machine.load_category(Category::Upcoming, false);
        machine
    }

    /// Watch the state; the receiver always sees the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn handle_event(&self, event: MovieListUiEvent) {
        match event {
            MovieListUiEvent::Navigate => {
                self.state.send_modify(ViewState::toggle_screen);
            }
            MovieListUiEvent::Paginate(category) => {
                if self.slot(category).is_some() {
                    self.load_category(category, true);
                } else {
                    debug!("Ignoring paginate for untracked list {}", category);
                }
            }
        }
    }

    fn slot(&self, category: Category) -> Option<&LoadSlot> {
        match category {
            Category::Popular => Some(&self.popular),
            Category::Upcoming => Some(&self.upcoming),
            _ => None,
        }
    }

    fn load_category(&self, category: Category, force_remote: bool) {
        let Some(slot) = self.slot(category) else {
            return;
        };

        let generation = slot.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut page = 1;
        self.state.send_modify(|state| {
            state.is_loading = true;
            page = state.page(category).unwrap_or(1);
        });

        debug!(
            "Loading {} page {} (generation {}, forced: {})",
            category, page, generation, force_remote
        );

        let outcomes = self.store.fetch_list(force_remote, category, page);
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&slot.generation);

        let task = self.runtime.spawn(async move {
            let mut outcomes = outcomes;
            while let Some(outcome) = outcomes.next().await {
                let outcome = match outcome {
                    FetchOutcome::Success(movies) => FetchOutcome::Success(shuffled(movies)),
                    other => other,
                };

                state.send_if_modified(|state| {
                    if current.load(Ordering::SeqCst) != generation {
                        return false;
                    }
                    state.apply_outcome(category, outcome)
                });
            }
        });

        slot.replace_task(task);
    }
}

impl Drop for MovieListStateMachine {
    fn drop(&mut self) {
        self.popular.abort();
        self.upcoming.abort();
    }
}

// Pages are shown in random order so the list doesn't look the same every visit
fn shuffled(mut movies: Vec<Movie>) -> Vec<Movie> {
    movies.shuffle(&mut rand::rng());
    movies
}
