use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::data::{NewPhotoRecord, PhotoRecord};
use super::edit::FilterParameters;
use super::overlay::OverlayList;
use crate::error::{PhotoboothError, Result};

/// Operations the photo core needs from persistent storage
///
/// One entity, looked up by id or by share token. There is no update:
/// an edit produces a new record.
pub trait PhotoStore: Send + Sync {
    /// Insert a record and return it with its assigned id
    ///
    /// A share token that already exists fails with `Conflict`. This
    /// check belongs to the store itself, so it holds even when two
    /// callers race past an earlier existence check.
    fn insert(&self, record: NewPhotoRecord) -> Result<PhotoRecord>;

    fn get_by_id(&self, id: i64) -> Result<Option<PhotoRecord>>;

    fn get_by_token(&self, token: &str) -> Result<Option<PhotoRecord>>;

    /// Delete a record, returning what was deleted
    fn delete_by_id(&self, id: i64) -> Result<Option<PhotoRecord>>;

    /// Newest first; `owner_id = None` lists every owner
    fn list_by_owner(
        &self,
        owner_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PhotoRecord>>;
}

const PHOTO_COLUMNS: &str =
    "id, user_id, image_url, share_token, filters, overlays, created_at";

/// The Library manages the SQLite photo database.
///
/// It stores one row per saved photo: the final image reference, the
/// share token and JSON snapshots of the filters and overlays.
pub struct Library {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open (or create) the database file and initialize the schema
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!(path = %db_path.display(), "photo database opened");

        let library = Library {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Private in-memory database (tests, one-off CLI runs)
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Mutex::new(Connection::open_in_memory()?),
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Default location of the database file
    ///
    /// - Linux: ~/.local/share/photobooth/photobooth.db
    /// - macOS: ~/Library/Application Support/photobooth/photobooth.db
    /// - Windows: %APPDATA%\photobooth\photobooth.db
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("photobooth");
        path.push("photobooth.db");
        path
    }

    /// Path to the database file (`None` for in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Create tables and indexes if they don't exist
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();

        // share_token is UNIQUE: this constraint is the final authority
        // on duplicate tokens
        conn.execute(
            "CREATE TABLE IF NOT EXISTS photos (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                image_url       TEXT NOT NULL CHECK (length(image_url) > 0),
                share_token     TEXT NOT NULL UNIQUE CHECK (length(share_token) > 0),
                filters         TEXT NOT NULL,
                overlays        TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_photos_created_at
             ON photos(created_at DESC)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_photos_user_created
             ON photos(user_id, created_at DESC)",
            [],
        )?;

        debug!("photo schema initialized");
        Ok(())
    }

    /// Number of stored photos
    pub fn photo_count(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves SQLite itself consistent
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PhotoStore for Library {
    fn insert(&self, record: NewPhotoRecord) -> Result<PhotoRecord> {
        let filters = record
            .filters
            .to_json()
            .map_err(|e| PhotoboothError::validation("INVALID_FILTER", e.to_string()))?;
        let overlays = record
            .overlays
            .to_json()
            .map_err(|e| PhotoboothError::validation("INVALID_OVERLAY", e.to_string()))?;

        // Stored with millisecond precision; keep the returned record identical
        let record = NewPhotoRecord {
            created_at: record.created_at.trunc_subsecs(3),
            ..record
        };

        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO photos (user_id, image_url, share_token, filters, overlays, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &record.owner_id,
                &record.image_ref,
                &record.share_token,
                &filters,
                &overlays,
                format_timestamp(&record.created_at),
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                debug!(id, owner = %record.owner_id, "photo inserted");
                Ok(record.with_id(id))
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation
                    && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                debug!(token = %record.share_token, "insert rejected by unique constraint");
                Err(PhotoboothError::Conflict(record.share_token))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_by_id(&self, id: i64) -> Result<Option<PhotoRecord>> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM photos WHERE id = ?1", PHOTO_COLUMNS),
                params![id],
                StoredPhoto::from_row,
            )
            .optional()?;
        row.map(StoredPhoto::into_record).transpose()
    }

    fn get_by_token(&self, token: &str) -> Result<Option<PhotoRecord>> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM photos WHERE share_token = ?1", PHOTO_COLUMNS),
                params![token],
                StoredPhoto::from_row,
            )
            .optional()?;
        row.map(StoredPhoto::into_record).transpose()
    }

    fn delete_by_id(&self, id: i64) -> Result<Option<PhotoRecord>> {
        // Single statement: the row is gone by the time we return it
        let row = self
            .conn()
            .query_row(
                &format!("DELETE FROM photos WHERE id = ?1 RETURNING {}", PHOTO_COLUMNS),
                params![id],
                StoredPhoto::from_row,
            )
            .optional()?;

        if row.is_some() {
            debug!(id, "photo deleted");
        }
        row.map(StoredPhoto::into_record).transpose()
    }

    fn list_by_owner(
        &self,
        owner_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PhotoRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM photos
             WHERE (?1 IS NULL OR user_id = ?1)
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
            PHOTO_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![owner_id, limit, offset], StoredPhoto::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredPhoto::into_record).collect()
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// A row as it sits in SQLite, before the JSON snapshots are checked
struct StoredPhoto {
    id: i64,
    owner_id: String,
    image_ref: String,
    share_token: String,
    filters: String,
    overlays: String,
    created_at: String,
}

impl StoredPhoto {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(StoredPhoto {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            image_ref: row.get(2)?,
            share_token: row.get(3)?,
            filters: row.get(4)?,
            overlays: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Strictly parse the snapshots; malformed data fails here, not at render time
    fn into_record(self) -> Result<PhotoRecord> {
        let id = self.id;
        let corrupt = |reason: String| PhotoboothError::CorruptRecord { id, reason };

        let filters = FilterParameters::from_json(&self.filters)
            .map_err(|e| corrupt(format!("filters: {}", e)))?;
        let overlays = OverlayList::from_json(&self.overlays)
            .map_err(|e| corrupt(format!("overlays: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("created_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(PhotoRecord {
            id,
            owner_id: self.owner_id,
            image_ref: self.image_ref,
            share_token: self.share_token,
            filters,
            overlays,
            created_at,
        })
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::overlay::{Overlay, Point};
    use chrono::TimeZone;

    fn new_record(owner: &str, token: &str, minute: u32) -> NewPhotoRecord {
        NewPhotoRecord {
            owner_id: owner.to_string(),
            image_ref: format!("/uploads/{}.png", token),
            share_token: token.to_string(),
            filters: FilterParameters::default(),
            overlays: OverlayList::new(),
            created_at: Utc.with_ymd_and_hms(2024, 12, 15, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let library = Library::open_in_memory().unwrap();
        let mut record = new_record("user_001", "abc123def", 30);
        record.filters.sepia = true;
        record.overlays = OverlayList::try_from(vec![Overlay::sticker(
            "heart",
            Point::new(120.0, 180.0),
            "❤️",
        )])
        .unwrap();

        let saved = library.insert(record).unwrap();
        assert!(saved.id > 0);

        assert_eq!(library.get_by_id(saved.id).unwrap(), Some(saved.clone()));
        assert_eq!(library.get_by_token("abc123def").unwrap(), Some(saved));
        assert_eq!(library.get_by_token("nope").unwrap(), None);
        assert_eq!(library.photo_count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_token_hits_constraint() {
        let library = Library::open_in_memory().unwrap();
        library.insert(new_record("user_001", "tok-1", 1)).unwrap();

        let err = library.insert(new_record("user_002", "tok-1", 2)).unwrap_err();
        assert!(err.is_conflict(), "unexpected error: {err:?}");
        assert_eq!(library.photo_count().unwrap(), 1);
    }

    #[test]
    fn test_delete_returns_record_once() {
        let library = Library::open_in_memory().unwrap();
        let saved = library.insert(new_record("user_001", "gone", 1)).unwrap();

        assert_eq!(library.delete_by_id(saved.id).unwrap(), Some(saved.clone()));
        assert_eq!(library.delete_by_id(saved.id).unwrap(), None);
        assert_eq!(library.get_by_token("gone").unwrap(), None);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let library = Library::open_in_memory().unwrap();
        let first = library.insert(new_record("u", "t1", 1)).unwrap();
        library.delete_by_id(first.id).unwrap();
        let second = library.insert(new_record("u", "t2", 2)).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_list_is_newest_first_and_paged() {
        let library = Library::open_in_memory().unwrap();
        library.insert(new_record("user_001", "a", 1)).unwrap();
        library.insert(new_record("user_002", "b", 2)).unwrap();
        library.insert(new_record("user_001", "c", 3)).unwrap();

        let mine: Vec<String> = library
            .list_by_owner(Some("user_001"), 10, 0)
            .unwrap()
            .into_iter()
            .map(|p| p.share_token)
            .collect();
        assert_eq!(mine, vec!["c", "a"]);

        let all = library.list_by_owner(None, 2, 1).unwrap();
        let tokens: Vec<&str> = all.iter().map(|p| p.share_token.as_str()).collect();
        assert_eq!(tokens, vec!["b", "a"]);
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let library = Library::open_in_memory().unwrap();
        let saved = library.insert(new_record("u", "bad", 1)).unwrap();
        library
            .conn()
            .execute(
                "UPDATE photos SET filters = '{\"brightness\":1.2}' WHERE id = ?1",
                params![saved.id],
            )
            .unwrap();

        let err = library.get_by_id(saved.id).unwrap_err();
        assert!(matches!(err, PhotoboothError::CorruptRecord { id, .. } if id == saved.id));
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("photobooth.db");

        let id = {
            let library = Library::open(&path).unwrap();
            library.insert(new_record("u", "persisted", 1)).unwrap().id
        };

        let library = Library::open(&path).unwrap();
        assert_eq!(library.path(), Some(path.as_path()));
        let found = library.get_by_id(id).unwrap().unwrap();
        assert_eq!(found.share_token, "persisted");
    }
}
