//! SQLite Document Store
//!
//! Persistent knowledge fragment storage using rusqlite with r2d2 connection
//! pooling. Fragments live in `knowledge_fragments`; their chunk text lives in
//! `fragment_chunks`, ordered by position.
//!
//! Lifecycle: a fragment is created with [`SqliteDocumentStore::upsert_fragment`],
//! may be soft-deleted and restored any number of times, and is removed for
//! good by [`SqliteDocumentStore::hard_delete`] (which also drops its chunks).

use std::path::Path;

use async_trait::async_trait;
use ghostwriter_core::{
    DocumentStore, FragmentFilter, FragmentFlags, KnowledgeFragment, OwnerScope, StoreError,
    StoreResult,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_dir;

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

const FRAGMENT_COLUMNS: &str = "id, owner_scope, owner_id, summary, usage_guide, \
     use_for_article, use_for_dialogue, is_edit_only, deleted";

/// Document store backed by SQLite
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: DbPool,
}

impl SqliteDocumentStore {
    /// Create an in-memory store for testing.
    ///
    /// The pool holds a single connection so every caller sees the same
    /// in-memory database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let store = Self { pool };
        store.init_schema()?;
        Ok(store)
    }

    /// Open (or create) a store backed by a database file
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(enable_foreign_keys);
        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let store = Self { pool };
        store.init_schema()?;
        info!(path = %path.display(), "opened knowledge database");
        Ok(store)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS knowledge_fragments (
                id TEXT PRIMARY KEY,
                owner_scope TEXT NOT NULL,
                owner_id TEXT,
                summary TEXT NOT NULL DEFAULT '',
                usage_guide TEXT NOT NULL DEFAULT '',
                use_for_article INTEGER,
                use_for_dialogue INTEGER,
                is_edit_only INTEGER NOT NULL DEFAULT 0,
                deleted INTEGER NOT NULL DEFAULT 0,
                deleted_at TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_fragments_scope ON knowledge_fragments(owner_scope)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS fragment_chunks (
                fragment_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                content TEXT NOT NULL,
                PRIMARY KEY (fragment_id, position),
                FOREIGN KEY (fragment_id) REFERENCES knowledge_fragments(id) ON DELETE CASCADE
            )",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    /// Insert or replace a fragment's metadata. Chunks are left untouched.
    pub fn upsert_fragment(&self, fragment: &KnowledgeFragment) -> AppResult<()> {
        fragment.validate()?;

        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO knowledge_fragments
                (id, owner_scope, owner_id, summary, usage_guide,
                 use_for_article, use_for_dialogue, is_edit_only, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                owner_scope = ?2, owner_id = ?3, summary = ?4, usage_guide = ?5,
                use_for_article = ?6, use_for_dialogue = ?7, is_edit_only = ?8,
                deleted = ?9, updated_at = CURRENT_TIMESTAMP",
            params![
                fragment.id,
                fragment.owner_scope.as_str(),
                fragment.owner_id,
                fragment.summary,
                fragment.usage_guide,
                fragment.flags.use_for_article,
                fragment.flags.use_for_dialogue,
                fragment.flags.is_edit_only,
                fragment.deleted,
            ],
        )?;
        Ok(())
    }

    /// Replace all chunks of a fragment, in the given order
    pub fn replace_chunks(&self, fragment_id: &str, chunks: &[String]) -> AppResult<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM knowledge_fragments WHERE id = ?1",
                params![fragment_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(AppError::not_found(format!("fragment {}", fragment_id)));
        }

        tx.execute(
            "DELETE FROM fragment_chunks WHERE fragment_id = ?1",
            params![fragment_id],
        )?;
        for (position, content) in chunks.iter().enumerate() {
            tx.execute(
                "INSERT INTO fragment_chunks (fragment_id, position, content) VALUES (?1, ?2, ?3)",
                params![fragment_id, position as i64, content],
            )?;
        }
        tx.commit()?;

        debug!(fragment_id, chunks = chunks.len(), "replaced fragment chunks");
        Ok(())
    }

    /// Mark a fragment deleted. Returns false if the fragment does not exist.
    pub fn soft_delete(&self, fragment_id: &str) -> AppResult<bool> {
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "UPDATE knowledge_fragments
             SET deleted = 1, deleted_at = ?2, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?1",
            params![fragment_id, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    /// Recover a soft-deleted fragment. Returns false if the fragment does not
    /// exist (including after a hard delete).
    pub fn restore(&self, fragment_id: &str) -> AppResult<bool> {
        let conn = self.get_connection()?;
        let changed = conn.execute(
            "UPDATE knowledge_fragments
             SET deleted = 0, deleted_at = NULL, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?1",
            params![fragment_id],
        )?;
        Ok(changed > 0)
    }

    /// Physically remove a fragment and its chunks. Terminal.
    pub fn hard_delete(&self, fragment_id: &str) -> AppResult<bool> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM fragment_chunks WHERE fragment_id = ?1",
            params![fragment_id],
        )?;
        let changed = tx.execute(
            "DELETE FROM knowledge_fragments WHERE id = ?1",
            params![fragment_id],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// Number of chunks stored for a fragment
    pub fn chunk_count(&self, fragment_id: &str) -> AppResult<usize> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM fragment_chunks WHERE fragment_id = ?1",
            params![fragment_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Run a read on a pooled connection off the async runtime
    async fn read<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| StoreError::unavailable(format!("connection pool: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::backend(format!("blocking read task failed: {}", e)))?
    }
}

fn enable_foreign_keys(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

fn sql_err(e: rusqlite::Error) -> StoreError {
    StoreError::backend(e.to_string())
}

/// Row shape before the scope column is decoded
struct FragmentRow {
    id: String,
    owner_scope: String,
    owner_id: Option<String>,
    summary: String,
    usage_guide: String,
    use_for_article: Option<bool>,
    use_for_dialogue: Option<bool>,
    is_edit_only: bool,
    deleted: bool,
}

impl FragmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_scope: row.get(1)?,
            owner_id: row.get(2)?,
            summary: row.get(3)?,
            usage_guide: row.get(4)?,
            use_for_article: row.get(5)?,
            use_for_dialogue: row.get(6)?,
            is_edit_only: row.get(7)?,
            deleted: row.get(8)?,
        })
    }

    fn into_fragment(self) -> StoreResult<KnowledgeFragment> {
        let owner_scope: OwnerScope = self
            .owner_scope
            .parse()
            .map_err(|e| StoreError::decode(format!("fragment {}: {}", self.id, e)))?;
        Ok(KnowledgeFragment {
            id: self.id,
            owner_scope,
            owner_id: self.owner_id,
            summary: self.summary,
            usage_guide: self.usage_guide,
            flags: FragmentFlags {
                use_for_article: self.use_for_article,
                use_for_dialogue: self.use_for_dialogue,
                is_edit_only: self.is_edit_only,
            },
            deleted: self.deleted,
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_fragment(&self, id: &str) -> StoreResult<Option<KnowledgeFragment>> {
        let id = id.to_string();
        self.read(move |conn| {
            let sql = format!(
                "SELECT {} FROM knowledge_fragments WHERE id = ?1",
                FRAGMENT_COLUMNS
            );
            let row = conn
                .query_row(&sql, params![id], FragmentRow::from_row)
                .optional()
                .map_err(sql_err)?;
            row.map(FragmentRow::into_fragment).transpose()
        })
        .await
    }

    async fn list_fragments(
        &self,
        scope: OwnerScope,
        filter: &FragmentFilter,
    ) -> StoreResult<Vec<KnowledgeFragment>> {
        let filter = filter.clone();
        self.read(move |conn| {
            let sql = format!(
                "SELECT {} FROM knowledge_fragments
                 WHERE owner_scope = ?1
                   AND (?2 OR deleted = 0)
                   AND (?3 IS NULL OR owner_id = ?3)
                 ORDER BY rowid
                 LIMIT ?4",
                FRAGMENT_COLUMNS
            );
            let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);
            let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
            let rows = stmt
                .query_map(
                    params![scope.as_str(), filter.include_deleted, filter.owner_id, limit],
                    FragmentRow::from_row,
                )
                .map_err(sql_err)?;

            let mut fragments = Vec::new();
            for row in rows {
                fragments.push(row.map_err(sql_err)?.into_fragment()?);
            }
            Ok(fragments)
        })
        .await
    }

    async fn get_chunks(&self, fragment_id: &str, limit: usize) -> StoreResult<Vec<String>> {
        let fragment_id = fragment_id.to_string();
        self.read(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT content FROM fragment_chunks
                     WHERE fragment_id = ?1
                     ORDER BY position
                     LIMIT ?2",
                )
                .map_err(sql_err)?;
            let rows = stmt
                .query_map(params![fragment_id, limit as i64], |row| row.get(0))
                .map_err(sql_err)?;
            rows.collect::<Result<Vec<String>, _>>().map_err(sql_err)
        })
        .await
    }
}
