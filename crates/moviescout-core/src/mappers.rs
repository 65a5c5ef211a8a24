// Conversions between the API, storage and domain shapes of a movie
use chrono::NaiveDate;
use moviescout_api::RemoteMovie;
use moviescout_cache::StoredMovieRecord;

use crate::models::{Category, Movie};

/// Tag an API movie with the list it came from, ready to be stored
pub fn remote_to_record(remote: RemoteMovie, category: Category) -> StoredMovieRecord {
    StoredMovieRecord {
        id: remote.id,
        title: remote.title,
        original_title: remote.original_title,
        original_language: remote.original_language,
        overview: remote.overview,
        poster_path: remote.poster_path,
        backdrop_path: remote.backdrop_path,
        release_date: remote.release_date.filter(|d| !d.is_empty()),
        genre_ids: remote.genre_ids,
        popularity: remote.popularity,
        vote_average: remote.vote_average,
        vote_count: remote.vote_count,
        adult: remote.adult,
        video: remote.video,
        category: category.as_str().to_string(),
    }
}

/// Build the domain movie, tagged with `category` rather than the stored tag
pub fn record_to_movie(record: StoredMovieRecord, category: Category) -> Movie {
    Movie {
        id: record.id,
        title: record.title,
        original_title: record.original_title,
        original_language: record.original_language,
        overview: record.overview,
        poster_path: record.poster_path,
        backdrop_path: record.backdrop_path,
        release_date: record.release_date.as_deref().and_then(parse_release_date),
        genre_ids: record.genre_ids,
        popularity: record.popularity,
        vote_average: record.vote_average,
        vote_count: record.vote_count,
        adult: record.adult,
        video: record.video,
        category,
    }
}

// TMDB sends "" or garbage for unreleased titles now and then
fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: u64) -> RemoteMovie {
        RemoteMovie {
            id,
            title: "Dune: Part Two".to_string(),
            original_title: "Dune: Part Two".to_string(),
            original_language: "en".to_string(),
            overview: "Paul Atreides unites with Chani.".to_string(),
            poster_path: Some("/dune.jpg".to_string()),
            release_date: Some("2024-02-27".to_string()),
            genre_ids: vec![878, 12],
            popularity: 300.0,
            vote_average: 8.2,
            vote_count: 5000,
            ..RemoteMovie::default()
        }
    }

    #[test]
    fn test_remote_to_record_tags_category() {
        let record = remote_to_record(remote(693134), Category::Upcoming);
        assert_eq!(record.id, 693134);
        assert_eq!(record.category, "upcoming");
        assert_eq!(record.genre_ids, vec![878, 12]);
    }

    #[test]
    fn test_record_to_movie_parses_date() {
        let record = remote_to_record(remote(1), Category::Popular);
        let movie = record_to_movie(record, Category::Popular);

        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2024, 2, 27));
        assert_eq!(movie.category, Category::Popular);
        assert_eq!(movie.title, "Dune: Part Two");
    }

    #[test]
    fn test_blank_or_bad_dates_become_none() {
        let mut blank = remote(2);
        blank.release_date = Some(String::new());
        let record = remote_to_record(blank, Category::Upcoming);
        assert!(record.release_date.is_none());

        let mut bad = remote_to_record(remote(3), Category::Upcoming);
        bad.release_date = Some("soon".to_string());
        assert!(record_to_movie(bad, Category::Upcoming).release_date.is_none());
    }
}
