// Movie list view state and the reducers that move it forward
use crate::models::{Category, FetchOutcome, Movie};

/// Events the presentation layer can send to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieListUiEvent {
    /// Flip between the popular and upcoming screens
    Navigate,
    /// Load the next page of a list
    Paginate(Category),
}

/// Everything the movie list screens render from
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Shared by both lists; whichever load reported last wins
    pub is_loading: bool,
    pub popular_movies: Vec<Movie>,
    pub popular_page: u32,
    pub upcoming_movies: Vec<Movie>,
    pub upcoming_page: u32,
    pub is_current_popular_screen: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            is_loading: false,
            popular_movies: Vec::new(),
            popular_page: 1,
            upcoming_movies: Vec::new(),
            upcoming_page: 1,
            is_current_popular_screen: true,
        }
    }
}

impl ViewState {
    /// Accumulated movies for a tracked list, empty for anything else
    pub fn movies(&self, category: Category) -> &[Movie] {
        match category {
            Category::Popular => &self.popular_movies,
            Category::Upcoming => &self.upcoming_movies,
            _ => &[],
        }
    }

    /// Next page to request, or None if the list is not tracked here
    pub fn page(&self, category: Category) -> Option<u32> {
        match category {
            Category::Popular => Some(self.popular_page),
            Category::Upcoming => Some(self.upcoming_page),
            _ => None,
        }
    }

    /// The list the user is looking at right now
    pub fn current_category(&self) -> Category {
        if self.is_current_popular_screen {
            Category::Popular
        } else {
            Category::Upcoming
        }
    }

    pub fn toggle_screen(&mut self) {
        self.is_current_popular_screen = !self.is_current_popular_screen;
    }

    /// Fold one fetch outcome for `category` into the state.
    ///
    /// `Success` pages are appended as given (shuffling, if any, happens
    /// before this). Returns whether anything changed, so watchers are only
    /// woken for real updates.
    pub fn apply_outcome(
        &mut self,
        category: Category,
        outcome: FetchOutcome<Vec<Movie>>,
    ) -> bool {
        match outcome {
            FetchOutcome::Loading(active) => self.set_loading(active),
            // Error terminates the fetch without a Loading(false)
            FetchOutcome::Error(_) => self.set_loading(false),
            FetchOutcome::Success(page) => self.append_page(category, page),
        }
    }

    pub fn set_loading(&mut self, active: bool) -> bool {
        let changed = self.is_loading != active;
        self.is_loading = active;
        changed
    }

    fn append_page(&mut self, category: Category, page: Vec<Movie>) -> bool {
        if page.is_empty() {
            return false;
        }

        let (movies, cursor) = match category {
            Category::Popular => (&mut self.popular_movies, &mut self.popular_page),
            Category::Upcoming => (&mut self.upcoming_movies, &mut self.upcoming_page),
            _ => return false,
        };

        movies.extend(page);
        *cursor += 1;
        true
    }
}
