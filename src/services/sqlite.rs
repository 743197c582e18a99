use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::Row;
use tokio::sync::Mutex;

use super::store::{
    into_fields, merge_fields, Document, DocumentStore, Fields, SetMode, StoreError,
};
use crate::db::DbPool;

/// Documents stored as JSON text in the `documents` table, namespaced by
/// project so several deployments can share one database.
///
/// Writes from this process go through one at a time; reads never wait.
#[derive(Clone)]
pub struct SqliteStore {
    db: DbPool,
    project: Arc<str>,
    write_lock: Arc<Mutex<()>>,
}

impl SqliteStore {
    pub fn new(db: DbPool, project: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            project: project.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }
}

fn parse_fields(raw: &str) -> Result<Fields, StoreError> {
    into_fields(serde_json::from_str::<Value>(raw)?)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT data, create_time, update_time FROM documents WHERE project = ?1 AND collection = ?2 AND id = ?3",
        )
        .bind(self.project())
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("data")?;
        Ok(Some(Document {
            id: id.to_string(),
            fields: parse_fields(&raw)?,
            create_time: row.try_get::<DateTime<Utc>, _>("create_time")?,
            update_time: row.try_get::<DateTime<Utc>, _>("update_time")?,
        }))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: SetMode,
    ) -> Result<(), StoreError> {
        let _writer = self.write_lock.lock().await;
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let fields = match mode {
            SetMode::Replace => fields,
            SetMode::Merge => {
                // Write before reading. SQLite will not upgrade a read lock
                // while another process holds the write lock, and it fails
                // at once instead of waiting out the busy timeout.
                sqlx::query(
                    r#"INSERT OR IGNORE INTO documents (project, collection, id, data, create_time, update_time)
                       VALUES (?1, ?2, ?3, '{}', ?4, ?4)"#,
                )
                .bind(self.project())
                .bind(collection)
                .bind(id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                let raw: String = sqlx::query_scalar(
                    "SELECT data FROM documents WHERE project = ?1 AND collection = ?2 AND id = ?3",
                )
                .bind(self.project())
                .bind(collection)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                let mut stored = parse_fields(&raw)?;
                merge_fields(&mut stored, fields);
                stored
            }
        };
        let data = serde_json::to_string(&fields)?;

        sqlx::query(
            r#"INSERT INTO documents (project, collection, id, data, create_time, update_time)
               VALUES (?1, ?2, ?3, ?4, ?5, ?5)
               ON CONFLICT (project, collection, id)
               DO UPDATE SET data = excluded.data, update_time = excluded.update_time"#,
        )
        .bind(self.project())
        .bind(collection)
        .bind(id)
        .bind(data)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM documents WHERE project = ?1 AND collection = ?2 AND id = ?3",
        )
        .bind(self.project())
        .bind(collection)
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
