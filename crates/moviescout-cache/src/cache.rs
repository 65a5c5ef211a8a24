use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};

/// A movie as it sits in the local database.
///
/// `category` is whatever list the movie was last fetched under. A movie that
/// shows up in two lists only keeps the most recent tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMovieRecord {
    pub id: u64,
    pub title: String,
    pub original_title: String,
    pub original_language: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub genre_ids: Vec<u32>,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: u32,
    pub adult: bool,
    pub video: bool,
    pub category: String,
}

const SELECT_COLUMNS: &str = "id, title, original_title, original_language, overview, \
     poster_path, backdrop_path, release_date, genre_ids, popularity, vote_average, \
     vote_count, adult, video, category";

/// Movie cache on top of SQLite
///
/// One row per movie id. Writes are last-write-wins upserts; nothing is ever
/// expired or evicted here.
pub struct MovieCache {
    conn: Mutex<Connection>,
}

impl MovieCache {
    /// Open (or create) the cache at `db_path`. `":memory:"` works too.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        // Initialize schema on first run
        Self::init_schema(&conn)?;

        debug!("Opened movie cache at {}", db_path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Shorthand for a throwaway in-memory cache
    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                original_title TEXT NOT NULL,
                original_language TEXT NOT NULL,
                overview TEXT NOT NULL,
                poster_path TEXT,
                backdrop_path TEXT,
                release_date TEXT,
                genre_ids TEXT NOT NULL,
                popularity REAL NOT NULL,
                vote_average REAL NOT NULL,
                vote_count INTEGER NOT NULL,
                adult INTEGER NOT NULL,
                video INTEGER NOT NULL,
                category TEXT NOT NULL,
                cached_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_movies_category ON movies(category)",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Every movie currently tagged with `category`
    pub fn get_by_category(&self, category: &str) -> Result<Vec<StoredMovieRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM movies WHERE category = ?1 ORDER BY id",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![category], RawRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    pub fn get_by_id(&self, id: u64) -> Result<Option<StoredMovieRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM movies WHERE id = ?1",
            SELECT_COLUMNS
        ))?;

        let raw = stmt
            .query_row(params![to_sql_id(id)?], RawRow::from_row)
            .optional()?;

        raw.map(RawRow::into_record).transpose()
    }

    /// Insert or overwrite the whole batch in a single transaction
    pub fn upsert_batch(&self, records: &[StoredMovieRecord]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO movies (
                    id, title, original_title, original_language, overview,
                    poster_path, backdrop_path, release_date, genre_ids, popularity,
                    vote_average, vote_count, adult, video, category, cached_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    original_title = excluded.original_title,
                    original_language = excluded.original_language,
                    overview = excluded.overview,
                    poster_path = excluded.poster_path,
                    backdrop_path = excluded.backdrop_path,
                    release_date = excluded.release_date,
                    genre_ids = excluded.genre_ids,
                    popularity = excluded.popularity,
                    vote_average = excluded.vote_average,
                    vote_count = excluded.vote_count,
                    adult = excluded.adult,
                    video = excluded.video,
                    category = excluded.category,
                    cached_at = excluded.cached_at",
            )?;

            for record in records {
                stmt.execute(params![
                    to_sql_id(record.id)?,
                    record.title,
                    record.original_title,
                    record.original_language,
                    record.overview,
                    record.poster_path,
                    record.backdrop_path,
                    record.release_date,
                    join_genres(&record.genre_ids),
                    record.popularity,
                    record.vote_average,
                    record.vote_count,
                    record.adult,
                    record.video,
                    record.category,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        debug!("Upserted {} movies", records.len());
        Ok(())
    }

    /// When `category` was last written, if ever
    pub fn last_cached_at(&self, category: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let ts: Option<i64> = conn.query_row(
            "SELECT MAX(cached_at) FROM movies WHERE category = ?1",
            params![category],
            |row| row.get(0),
        )?;

        Ok(ts.and_then(|secs| Utc.timestamp_opt(secs, 0).single()))
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Drop every cached movie
    pub fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM movies", [])?;
        Ok(removed)
    }
}

/// Columns as SQLite hands them back, before we validate anything
struct RawRow {
    id: i64,
    title: String,
    original_title: String,
    original_language: String,
    overview: String,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    genre_ids: String,
    popularity: f64,
    vote_average: f64,
    vote_count: u32,
    adult: bool,
    video: bool,
    category: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            original_title: row.get(2)?,
            original_language: row.get(3)?,
            overview: row.get(4)?,
            poster_path: row.get(5)?,
            backdrop_path: row.get(6)?,
            release_date: row.get(7)?,
            genre_ids: row.get(8)?,
            popularity: row.get(9)?,
            vote_average: row.get(10)?,
            vote_count: row.get(11)?,
            adult: row.get(12)?,
            video: row.get(13)?,
            category: row.get(14)?,
        })
    }

    fn into_record(self) -> Result<StoredMovieRecord> {
        let id = u64::try_from(self.id).map_err(|_| CacheError::CorruptRecord {
            id: 0,
            reason: format!("negative id {}", self.id),
        })?;
        let genre_ids = split_genres(&self.genre_ids).map_err(|reason| CacheError::CorruptRecord {
            id,
            reason,
        })?;

        Ok(StoredMovieRecord {
            id,
            title: self.title,
            original_title: self.original_title,
            original_language: self.original_language,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date: self.release_date,
            genre_ids,
            popularity: self.popularity,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            adult: self.adult,
            video: self.video,
            category: self.category,
        })
    }
}

fn to_sql_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| CacheError::CorruptRecord {
        id,
        reason: "id does not fit in an SQLite integer".to_string(),
    })
}

// Genres go in as "28,12,16"
fn join_genres(genre_ids: &[u32]) -> String {
    genre_ids
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_genres(raw: &str) -> std::result::Result<Vec<u32>, String> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| format!("bad genre id {:?}: {}", part, e))
        })
        .collect()
}
