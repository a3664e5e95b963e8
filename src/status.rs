// Status log - append-only client check-ins in SQLite

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

/// One client check-in. Append-only; never updated or deleted here.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusRecord {
    pub id: String,
    pub client_name: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// Handle to the SQLite-backed status log.
#[derive(Clone)]
pub struct StatusStore {
    pool: Pool<Sqlite>,
}

impl StatusStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let uri = format!("sqlite://{}?mode=rwc", path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await?;

        let store = StatusStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Open an in-memory database (tests).
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = StatusStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS status_checks (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create(&self, client_name: &str) -> Result<StatusRecord> {
        let record = StatusRecord {
            id: Uuid::new_v4().to_string(),
            client_name: client_name.to_string(),
            created_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
        };

        sqlx::query("INSERT INTO status_checks (id, client_name, created_at) VALUES (?, ?, ?)")
            .bind(&record.id)
            .bind(&record.client_name)
            .bind(&record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<StatusRecord>> {
        let records = sqlx::query_as::<_, StatusRecord>(
            "SELECT id, client_name, created_at FROM status_checks",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let store = StatusStore::open_memory().await.unwrap();

        let created = store.create("test_client").await.unwrap();
        assert_eq!(created.client_name, "test_client");
        assert!(!created.id.is_empty());
        assert!(created.created_at.contains('T'));

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn records_accumulate() {
        let store = StatusStore::open_memory().await.unwrap();
        store.create("one").await.unwrap();
        store.create("two").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
