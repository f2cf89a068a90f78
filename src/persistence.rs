use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use crate::error::PersistenceError;
use crate::session::SessionStore;
use crate::workout::Workout;

/// Key under which the whole session is stored
pub const WORKOUTS_KEY: &str = "workouts";

/// Opaque key/value blob storage
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;
    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
    /// Removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// SQLite-backed blob store, one row per key
#[derive(Debug)]
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Open (or create) the database at `path`, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(SqliteBlobStore { conn })
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.conn.execute(
            r#"
            INSERT INTO blobs (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, bytes],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.conn.execute("DELETE FROM blobs WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-process blob store; contents die with the value
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Saves and restores the session under [`WORKOUTS_KEY`]
#[derive(Debug)]
pub struct WorkoutPersistence<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> WorkoutPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Overwrites the stored blob with every workout, derived fields included.
    ///
    /// JSON has no encoding for infinities or NaN, so a session holding one is
    /// refused and the previous blob stays in place.
    pub fn save(&mut self, session: &SessionStore) -> Result<(), PersistenceError> {
        if let Some(bad) = session.iter().find(|w| !w.is_finite()) {
            return Err(PersistenceError::NonFinite(bad.id().clone()));
        }
        let data = serde_json::to_vec(session.all())?;
        self.store.set(WORKOUTS_KEY, &data)
    }

    /// Stored workouts in their saved order; empty when nothing was saved
    pub fn load(&self) -> Result<Vec<Workout>, PersistenceError> {
        match self.store.get(WORKOUTS_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice::<Option<Vec<Workout>>>(&bytes)?.unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.store.remove(WORKOUTS_KEY)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
