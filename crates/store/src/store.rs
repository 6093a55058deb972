use std::path::PathBuf;

use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::{debug, info};

use itembox_core::Item;

use crate::error::StoreError;
use crate::parse::Limit;

const CREATE_ITEMS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        value TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )";

/// Handle to the item database file.
///
/// Holds no connection. Each operation connects, runs one statement and
/// closes, so concurrent callers only contend on SQLite's own file lock.
#[derive(Debug, Clone)]
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the database file and `items` table if absent.
    pub async fn init(&self) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        sqlx::query(CREATE_ITEMS_TABLE).execute(&mut conn).await?;
        conn.close().await?;
        info!(path = %self.path.display(), "Database initialized");
        Ok(())
    }

    /// Insert a new item and return its assigned id.
    pub async fn insert(
        &self,
        name: &str,
        description: &str,
        value: &str,
    ) -> Result<i64, StoreError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("INSERT INTO items (name, description, value) VALUES (?, ?, ?)")
            .bind(name)
            .bind(description)
            .bind(value)
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        let id = result.last_insert_rowid();
        debug!(id, name, "Item inserted");
        Ok(id)
    }

    /// Up to `limit` items, most recently created first.
    pub async fn list_recent(&self, limit: Limit) -> Result<Vec<Item>, StoreError> {
        let mut conn = self.connect().await?;
        // created_at has one-second resolution; id breaks ties.
        let rows = sqlx::query(
            "SELECT id, name, description, value, created_at FROM items \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit.get()))
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;

        let items = rows.iter().map(row_to_item).collect::<Result<Vec<_>, _>>()?;
        debug!(limit = limit.get(), count = items.len(), "Items listed");
        Ok(items)
    }

    /// Fetch a single item; `None` when no row has this id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(
            "SELECT id, name, description, value, created_at FROM items WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut conn)
        .await?;
        conn.close().await?;

        let item = row.as_ref().map(row_to_item).transpose()?;
        debug!(id, found = item.is_some(), "Item lookup");
        Ok(item)
    }

    async fn connect(&self) -> Result<SqliteConnection, StoreError> {
        let conn = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .connect()
            .await?;
        Ok(conn)
    }
}

fn row_to_item(row: &SqliteRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        value: row.try_get("value")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{format_item_detail, format_item_list, NO_ITEMS};

    async fn temp_store() -> (tempfile::TempDir, ItemStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ItemStore::new(dir.path().join("items.db"));
        store.init().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_fields() {
        let (_dir, store) = temp_store().await;

        let id = store.insert("Widget", "A small widget", "9.99").await.unwrap();
        assert_eq!(id, 1);

        let item = store.get_by_id(id).await.unwrap().expect("item exists");
        assert_eq!(item.name, "Widget");
        assert_eq!(item.description.as_deref(), Some("A small widget"));
        assert_eq!(item.value.as_deref(), Some("9.99"));

        let text = format_item_detail(&item);
        assert!(text.contains("Name: Widget"));
        assert!(text.contains("Description: A small widget"));
        assert!(text.contains("Value: 9.99"));
    }

    #[tokio::test]
    async fn ids_increase_in_insertion_order() {
        let (_dir, store) = temp_store().await;

        let mut last = 0;
        for name in ["a", "b", "c", "d"] {
            let id = store.insert(name, "", "").await.unwrap();
            assert!(id > last, "id {} not greater than {}", id, last);
            last = id;
        }
    }

    #[tokio::test]
    async fn list_recent_respects_limit_and_order() {
        let (_dir, store) = temp_store().await;
        for i in 0..5 {
            store.insert(&format!("item-{}", i), "", "").await.unwrap();
        }

        let items = store.list_recent(Limit::new(3)).await.unwrap();
        assert_eq!(items.len(), 3);
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);

        let all = store.list_recent(Limit::default()).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn list_recent_on_empty_store_is_empty() {
        let (_dir, store) = temp_store().await;
        let items = store.list_recent(Limit::new(5)).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(format_item_list(&items), NO_ITEMS);
    }

    #[tokio::test]
    async fn zero_limit_returns_nothing() {
        let (_dir, store) = temp_store().await;
        store.insert("x", "", "").await.unwrap();
        assert!(store.list_recent(Limit::new(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_id_is_none() {
        let (_dir, store) = temp_store().await;
        assert!(store.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let (_dir, store) = temp_store().await;
        store.insert("kept", "", "").await.unwrap();
        store.init().await.unwrap();
        assert_eq!(store.list_recent(Limit::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_optional_fields_are_stored_as_text() {
        let (_dir, store) = temp_store().await;
        let id = store.insert("bare", "", "").await.unwrap();
        let item = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(item.description.as_deref(), Some(""));
        assert_eq!(item.value.as_deref(), Some(""));
    }
}
