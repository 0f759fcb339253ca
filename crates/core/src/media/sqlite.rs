//! SQLite-backed media document store.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, ToSql};
use tracing::debug;

use super::{
    DocumentPatch, MediaBody, MediaDocument, MediaError, MediaIdentity, MediaListQuery, MediaPage,
    MediaStats, MediaStore, MediaType,
};

/// Largest page the store will return in one call.
pub const MAX_PAGE_SIZE: u32 = 500;

const SELECT_COLUMNS: &str = "external_id, title, genres, description, rating, release_year, \
                              poster, backdrop, logo, nested, version, updated_at";

/// SQLite-backed media store: one table per media type.
pub struct SqliteMediaStore {
    conn: Mutex<Connection>,
}

impl SqliteMediaStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path) -> Result<Self, MediaError> {
        let conn = Connection::open(path).map_err(|e| MediaError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, MediaError> {
        let conn =
            Connection::open_in_memory().map_err(|e| MediaError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), MediaError> {
        // `nested` holds the streams (movies) or seasons (tv_shows) as JSON.
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS movies (
                external_id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                genres TEXT NOT NULL DEFAULT '[]',
                description TEXT,
                rating REAL NOT NULL DEFAULT 0,
                release_year INTEGER NOT NULL,
                poster TEXT,
                backdrop TEXT,
                logo TEXT,
                nested TEXT NOT NULL DEFAULT '[]',
                version INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_movies_updated_at ON movies(updated_at);
            CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title);

            CREATE TABLE IF NOT EXISTS tv_shows (
                external_id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                genres TEXT NOT NULL DEFAULT '[]',
                description TEXT,
                rating REAL NOT NULL DEFAULT 0,
                release_year INTEGER NOT NULL,
                poster TEXT,
                backdrop TEXT,
                logo TEXT,
                nested TEXT NOT NULL DEFAULT '[]',
                version INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tv_shows_updated_at ON tv_shows(updated_at);
            CREATE INDEX IF NOT EXISTS idx_tv_shows_title ON tv_shows(title);
            "#,
        )
        .map_err(|e| MediaError::Database(e.to_string()))?;

        // Lowercased title for search; SQLite's LIKE only folds ASCII.
        for table in [Self::table(MediaType::Movie), Self::table(MediaType::TvShow)] {
            // Ignore error if column already exists
            let _ = conn.execute(
                &format!(
                    "ALTER TABLE {} ADD COLUMN title_search TEXT NOT NULL DEFAULT ''",
                    table
                ),
                [],
            );
            Self::backfill_title_search(conn, table)?;
        }

        Ok(())
    }

    fn backfill_title_search(conn: &Connection, table: &str) -> Result<(), MediaError> {
        let pending: Vec<(u32, String)> = {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT external_id, title FROM {} WHERE title_search = ''",
                    table
                ))
                .map_err(|e| MediaError::Database(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(|e| MediaError::Database(e.to_string()))?;
            rows.collect::<rusqlite::Result<_>>()
                .map_err(|e| MediaError::Database(e.to_string()))?
        };

        for (external_id, title) in &pending {
            conn.execute(
                &format!("UPDATE {} SET title_search = ? WHERE external_id = ?", table),
                params![search_key(title), external_id],
            )
            .map_err(|e| MediaError::Database(e.to_string()))?;
        }
        if !pending.is_empty() {
            debug!("Backfilled search titles for {} rows in {}", pending.len(), table);
        }
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, MediaError> {
        self.conn
            .lock()
            .map_err(|_| MediaError::Database("connection lock poisoned".to_string()))
    }

    fn table(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Movie => "movies",
            MediaType::TvShow => "tv_shows",
        }
    }

    fn nested_json(document: &MediaDocument) -> Result<String, MediaError> {
        if document.body.media_type() != document.identity.media_type {
            return Err(MediaError::InvalidInput(format!(
                "document {} has a {} body",
                document.identity,
                document.body.media_type()
            )));
        }
        let json = match &document.body {
            MediaBody::Movie { streams } => serde_json::to_string(streams),
            MediaBody::TvShow { seasons } => serde_json::to_string(seasons),
        };
        json.map_err(|e| MediaError::Database(e.to_string()))
    }

    fn row_to_document(media_type: MediaType, row: &rusqlite::Row) -> rusqlite::Result<MediaDocument> {
        let genres_json: String = row.get(2)?;
        let nested_json: String = row.get(9)?;
        let updated_at_str: String = row.get(11)?;

        let genres: BTreeSet<String> = serde_json::from_str(&genres_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        let body = match media_type {
            MediaType::Movie => MediaBody::Movie {
                streams: serde_json::from_str(&nested_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e))
                })?,
            },
            MediaType::TvShow => MediaBody::TvShow {
                seasons: serde_json::from_str(&nested_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e))
                })?,
            },
        };

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;

        Ok(MediaDocument {
            identity: MediaIdentity {
                media_type,
                external_id: row.get(0)?,
            },
            title: row.get(1)?,
            genres,
            description: row.get(3)?,
            rating: row.get(4)?,
            release_year: row.get(5)?,
            poster: row.get(6)?,
            backdrop: row.get(7)?,
            logo: row.get(8)?,
            updated_at,
            version: row.get(10)?,
            body,
        })
    }

    /// Build the SET clause for a descriptive patch.
    fn build_set_clause(
        patch: &DocumentPatch,
    ) -> Result<(Vec<&'static str>, Vec<Box<dyn ToSql>>), MediaError> {
        let mut assignments = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref title) = patch.title {
            assignments.push("title = ?");
            params.push(Box::new(title.clone()));
            assignments.push("title_search = ?");
            params.push(Box::new(search_key(title)));
        }
        if let Some(ref genres) = patch.genres {
            let json =
                serde_json::to_string(genres).map_err(|e| MediaError::Database(e.to_string()))?;
            assignments.push("genres = ?");
            params.push(Box::new(json));
        }
        if let Some(ref description) = patch.description {
            assignments.push("description = ?");
            params.push(Box::new(description.clone()));
        }
        if let Some(rating) = patch.rating {
            assignments.push("rating = ?");
            params.push(Box::new(rating));
        }
        if let Some(year) = patch.release_year {
            assignments.push("release_year = ?");
            params.push(Box::new(year));
        }
        if let Some(ref poster) = patch.poster {
            assignments.push("poster = ?");
            params.push(Box::new(poster.clone()));
        }
        if let Some(ref backdrop) = patch.backdrop {
            assignments.push("backdrop = ?");
            params.push(Box::new(backdrop.clone()));
        }
        if let Some(ref logo) = patch.logo {
            assignments.push("logo = ?");
            params.push(Box::new(logo.clone()));
        }
        if let Some(updated_at) = patch.updated_at {
            assignments.push("updated_at = ?");
            params.push(Box::new(format_timestamp(updated_at)));
        }

        Ok((assignments, params))
    }

    fn count(conn: &Connection, table: &str) -> Result<u64, MediaError> {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| MediaError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}

/// Fixed-width RFC 3339 so lexical order matches chronological order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Case-folded form of a title, stored alongside it for search.
fn search_key(title: &str) -> String {
    title.to_lowercase()
}

/// Escape LIKE wildcards so the search text matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search_key(search)
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl MediaStore for SqliteMediaStore {
    fn find(&self, identity: &MediaIdentity) -> Result<Option<MediaDocument>, MediaError> {
        let conn = self.conn()?;
        let media_type = identity.media_type;

        let result = conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE external_id = ?",
                SELECT_COLUMNS,
                Self::table(media_type)
            ),
            params![identity.external_id],
            |row| Self::row_to_document(media_type, row),
        );

        match result {
            Ok(document) => Ok(Some(document)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(MediaError::Database(e.to_string())),
        }
    }

    fn upsert_write(
        &self,
        document: &MediaDocument,
        expected_version: Option<i64>,
    ) -> Result<i64, MediaError> {
        let nested = Self::nested_json(document)?;
        let conn = self.conn()?;
        let identity = document.identity;
        let table = Self::table(identity.media_type);
        let updated_at = format_timestamp(document.updated_at);

        match expected_version {
            None => {
                let genres = serde_json::to_string(&document.genres)
                    .map_err(|e| MediaError::Database(e.to_string()))?;

                let result = conn.execute(
                    &format!(
                        "INSERT INTO {} (external_id, title, title_search, genres, description, rating,
                                         release_year, poster, backdrop, logo, nested, version,
                                         updated_at)
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)",
                        table
                    ),
                    params![
                        identity.external_id,
                        &document.title,
                        search_key(&document.title),
                        genres,
                        &document.description,
                        document.rating,
                        document.release_year,
                        &document.poster,
                        &document.backdrop,
                        &document.logo,
                        nested,
                        updated_at,
                    ],
                );

                match result {
                    Ok(_) => {
                        debug!("Inserted {} at version 1", identity);
                        Ok(1)
                    }
                    Err(rusqlite::Error::SqliteFailure(err, _))
                        if err.code == ErrorCode::ConstraintViolation =>
                    {
                        Err(MediaError::ConcurrentUpdateConflict { identity })
                    }
                    Err(e) => Err(MediaError::Database(e.to_string())),
                }
            }
            Some(version) => {
                let rows_affected = conn
                    .execute(
                        &format!(
                            "UPDATE {} SET nested = ?, updated_at = ?, version = version + 1
                             WHERE external_id = ? AND version = ?",
                            table
                        ),
                        params![nested, updated_at, identity.external_id, version],
                    )
                    .map_err(|e| MediaError::Database(e.to_string()))?;

                if rows_affected == 0 {
                    return Err(MediaError::ConcurrentUpdateConflict { identity });
                }
                debug!("Updated {} to version {}", identity, version + 1);
                Ok(version + 1)
            }
        }
    }

    fn list(&self, query: &MediaListQuery) -> Result<MediaPage, MediaError> {
        if query.page == 0 {
            return Err(MediaError::InvalidInput("page starts at 1".to_string()));
        }
        if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
            return Err(MediaError::InvalidInput(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let conn = self.conn()?;
        let media_type = query.media_type;
        let table = Self::table(media_type);

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        // Both sides are already case-folded, so LIKE only does the substring match.
        let (where_clause, params): (&str, Vec<Box<dyn ToSql>>) = match search {
            Some(pattern) => (
                "WHERE title_search LIKE ? ESCAPE '\\'",
                vec![Box::new(pattern) as Box<dyn ToSql>],
            ),
            None => ("", Vec::new()),
        };
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {} {}", table, where_clause),
                param_refs.as_slice(),
                |row| row.get(0),
            )
            .map_err(|e| MediaError::Database(e.to_string()))?;

        let sql = format!(
            "SELECT {} FROM {} {} ORDER BY updated_at DESC, external_id DESC LIMIT {} OFFSET {}",
            SELECT_COLUMNS,
            table,
            where_clause,
            query.page_size,
            query.offset()
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| MediaError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                Self::row_to_document(media_type, row)
            })
            .map_err(|e| MediaError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| MediaError::Database(e.to_string()))?);
        }

        Ok(MediaPage {
            items,
            total: total as u64,
            page: query.page,
            page_size: query.page_size,
        })
    }

    fn update_fields(
        &self,
        identity: &MediaIdentity,
        patch: &DocumentPatch,
    ) -> Result<bool, MediaError> {
        let (assignments, mut params) = Self::build_set_clause(patch)?;
        if assignments.is_empty() {
            return Err(MediaError::InvalidInput(
                "patch contains no fields".to_string(),
            ));
        }

        let conn = self.conn()?;
        let sql = format!(
            "UPDATE {} SET {} WHERE external_id = ?",
            Self::table(identity.media_type),
            assignments.join(", ")
        );
        params.push(Box::new(identity.external_id));
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows_affected = conn
            .execute(&sql, param_refs.as_slice())
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    fn delete(&self, identity: &MediaIdentity) -> Result<bool, MediaError> {
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE external_id = ?",
                    Self::table(identity.media_type)
                ),
                params![identity.external_id],
            )
            .map_err(|e| MediaError::Database(e.to_string()))?;

        Ok(rows_affected > 0)
    }

    fn stats(&self) -> Result<MediaStats, MediaError> {
        let conn = self.conn()?;

        Ok(MediaStats {
            movie_count: Self::count(&conn, Self::table(MediaType::Movie))?,
            tv_show_count: Self::count(&conn, Self::table(MediaType::TvShow))?,
        })
    }
}
