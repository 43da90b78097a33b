//! SQLite-backed store via libsql. Implements PoiDirectory and ContentRepository.
//!
//! One database file (data/promo.db) holds the point-of-interest catalog and all
//! committed content. A commit is one IMMEDIATE transaction: guarded count
//! increment (`current < max`) followed by the insert, so the count can never
//! pass the limit even with several writers on separate connections.

use crate::domain::{
    ContentDraft, ContentItem, DomainError, ImageDescriptor, MimeType, PointOfInterest,
};
use crate::ports::{ContentRepository, PoiDirectory, SaveOutcome};
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, Row, Transaction, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const POINTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS points_of_interest (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    max_content_count INTEGER NOT NULL,
    current_content_count INTEGER NOT NULL DEFAULT 0
)"#;

/// `draft_id` is the proposal token; UNIQUE makes a second commit of the same draft fail.
const CONTENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS content_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    draft_id TEXT NOT NULL UNIQUE,
    poi_id TEXT NOT NULL REFERENCES points_of_interest (id),
    byte_size INTEGER NOT NULL,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    mime_type TEXT NOT NULL,
    created_at INTEGER NOT NULL
)"#;
const CONTENT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_content_poi ON content_items (poi_id, id)";

const POINT_COLUMNS: &str = "id, name, max_content_count, current_content_count";
const CONTENT_COLUMNS: &str = "id, poi_id, byte_size, width, height, mime_type, created_at";

/// Wait this long for a competing writer before giving up with SQLITE_BUSY.
const BUSY_TIMEOUT_MS: u32 = 5000;

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

/// SQLite repository. Safe to share via Arc; each call opens its own connection.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup.
    ///
    /// Sets WAL mode and synchronous=NORMAL for concurrent read/write
    /// without sacrificing durability.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join("promo.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // WAL: concurrent readers + one writer.
        run_pragma(&conn, "PRAGMA journal_mode=WAL").await?;
        run_pragma(&conn, "PRAGMA synchronous=NORMAL").await?;

        conn.execute(POINTS_TABLE, ()).await.map_err(repo_err)?;
        conn.execute(CONTENT_TABLE, ()).await.map_err(repo_err)?;
        conn.execute(CONTENT_INDEX, ()).await.map_err(repo_err)?;

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    /// Open a connection with the busy timeout applied.
    async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        run_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).await?;
        Ok(conn)
    }

    /// Insert or update a catalog entry. The current count of an existing row is kept;
    /// only the name and limit come from the catalog. A limit below the stored count
    /// is refused with `DomainError::Catalog` and the row is left untouched.
    pub async fn upsert_point(&self, poi: &PointOfInterest) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                r#"
            INSERT INTO points_of_interest (id, name, max_content_count, current_content_count)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                max_content_count = excluded.max_content_count
            WHERE excluded.max_content_count >= points_of_interest.current_content_count
            "#,
                params![
                    poi.id.as_str(),
                    poi.name.as_str(),
                    i64::from(poi.max_content_count),
                    i64::from(poi.current_content_count)
                ],
            )
            .await
            .map_err(repo_err)?;
        if changed == 0 {
            warn!(poi_id = %poi.id, max = poi.max_content_count, "catalog limit below stored count");
            return Err(DomainError::Catalog(format!(
                "{}: max_content_count {} is below the current count",
                poi.id, poi.max_content_count
            )));
        }
        Ok(())
    }

    /// Guarded increment + insert inside `tx`. The caller commits or rolls back.
    async fn apply_draft(
        tx: &Transaction,
        draft: &ContentDraft,
    ) -> Result<SaveOutcome, DomainError> {
        let poi_id = draft.point_of_interest_id.as_str();

        // Write first so the transaction holds the write lock before any read.
        let bumped = tx
            .execute(
                r#"
                UPDATE points_of_interest
                SET current_content_count = current_content_count + 1
                WHERE id = ?1 AND current_content_count < max_content_count
                "#,
                params![poi_id],
            )
            .await
            .map_err(repo_err)?;

        if bumped == 0 {
            return match select_point(tx, poi_id).await? {
                Some(p) => Ok(SaveOutcome::CapacityExceeded {
                    limit: p.max_content_count,
                }),
                None => Err(DomainError::PointNotFound(poi_id.to_string())),
            };
        }

        let draft_id = draft.draft_id.to_string();
        let mut existing = tx
            .query(
                "SELECT id FROM content_items WHERE draft_id = ?1",
                params![draft_id.as_str()],
            )
            .await
            .map_err(repo_err)?;
        if existing.next().await.map_err(repo_err)?.is_some() {
            return Err(DomainError::Repo(format!(
                "draft {} is already committed",
                draft_id
            )));
        }

        // Millisecond precision, so the returned item equals what a later read yields.
        let created_ms = Utc::now().timestamp_millis();
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms)
            .ok_or_else(|| DomainError::Repo("clock out of range".into()))?;
        let d = &draft.descriptor;
        tx.execute(
            r#"
            INSERT INTO content_items (draft_id, poi_id, byte_size, width, height, mime_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                draft_id.as_str(),
                poi_id,
                d.byte_size as i64,
                i64::from(d.width),
                i64::from(d.height),
                d.mime_type.as_str(),
                created_ms
            ],
        )
        .await
        .map_err(repo_err)?;
        let id = tx.last_insert_rowid();

        let point = select_point(tx, poi_id)
            .await?
            .ok_or_else(|| DomainError::PointNotFound(poi_id.to_string()))?;

        Ok(SaveOutcome::Saved {
            item: ContentItem {
                id,
                point_of_interest_id: poi_id.to_string(),
                descriptor: *d,
                created_at,
            },
            point,
        })
    }
}

/// PRAGMAs return a row; use query and drain it (execute fails when rows are returned).
async fn run_pragma(conn: &Connection, sql: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|e| DomainError::Repo(format!("{} failed: {}", sql, e)))?;
    while rows.next().await.map_err(repo_err)?.is_some() {}
    Ok(())
}

async fn select_point(conn: &Connection, id: &str) -> Result<Option<PointOfInterest>, DomainError> {
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM points_of_interest WHERE id = ?1", POINT_COLUMNS),
            params![id],
        )
        .await
        .map_err(repo_err)?;
    match rows.next().await.map_err(repo_err)? {
        Some(row) => Ok(Some(row_to_point(&row)?)),
        None => Ok(None),
    }
}

fn get_u32(row: &Row, idx: i32) -> Result<u32, DomainError> {
    let v: i64 = row.get(idx).map_err(repo_err)?;
    u32::try_from(v).map_err(repo_err)
}

fn row_to_point(row: &Row) -> Result<PointOfInterest, DomainError> {
    Ok(PointOfInterest {
        id: row.get(0).map_err(repo_err)?,
        name: row.get(1).map_err(repo_err)?,
        max_content_count: get_u32(row, 2)?,
        current_content_count: get_u32(row, 3)?,
    })
}

fn row_to_content(row: &Row) -> Result<ContentItem, DomainError> {
    let mime: String = row.get(5).map_err(repo_err)?;
    let mime_type = MimeType::parse(&mime)
        .ok_or_else(|| DomainError::Repo(format!("unknown stored mime type '{}'", mime)))?;
    let created_ms: i64 = row.get(6).map_err(repo_err)?;
    let byte_size: i64 = row.get(2).map_err(repo_err)?;
    Ok(ContentItem {
        id: row.get(0).map_err(repo_err)?,
        point_of_interest_id: row.get(1).map_err(repo_err)?,
        descriptor: ImageDescriptor {
            byte_size: u64::try_from(byte_size).map_err(repo_err)?,
            width: get_u32(row, 3)?,
            height: get_u32(row, 4)?,
            mime_type,
        },
        created_at: DateTime::<Utc>::from_timestamp_millis(created_ms)
            .ok_or_else(|| DomainError::Repo(format!("bad timestamp {}", created_ms)))?,
    })
}

#[async_trait::async_trait]
impl PoiDirectory for SqliteRepo {
    async fn find_by_id(&self, id: &str) -> Result<Option<PointOfInterest>, DomainError> {
        let conn = self.conn().await?;
        select_point(&conn, id).await
    }
}

#[async_trait::async_trait]
impl ContentRepository for SqliteRepo {
    async fn save(&self, draft: &ContentDraft) -> Result<SaveOutcome, DomainError> {
        let conn = self.conn().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)?;

        match Self::apply_draft(&tx, draft).await {
            Ok(saved @ SaveOutcome::Saved { .. }) => {
                tx.commit().await.map_err(repo_err)?;
                if let SaveOutcome::Saved { item, point } = &saved {
                    info!(
                        path = %self.db_path.display(),
                        poi_id = %point.id,
                        content_id = item.id,
                        count = point.current_content_count,
                        "content committed"
                    );
                }
                Ok(saved)
            }
            Ok(full) => {
                tx.rollback().await.map_err(repo_err)?;
                debug!(poi_id = %draft.point_of_interest_id, "commit refused: capacity reached");
                Ok(full)
            }
            Err(e) => {
                // Report the save error, not the rollback error.
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn find_content(&self, id: i64) -> Result<Option<ContentItem>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM content_items WHERE id = ?1", CONTENT_COLUMNS),
                params![id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(row_to_content(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_point(&self, poi_id: &str) -> Result<Vec<ContentItem>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM content_items WHERE poi_id = ?1 ORDER BY id ASC",
                    CONTENT_COLUMNS
                ),
                params![poi_id],
            )
            .await
            .map_err(repo_err)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            items.push(row_to_content(&row)?);
        }
        Ok(items)
    }
}
