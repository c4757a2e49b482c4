//! Durable Menu State Store
//!
//! One row per user holding the location of their open help menu and the
//! time of their last interaction. Survives restarts so the recovery pass
//! can resume or clean up in-flight menus.

use anyhow::Result;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, info};

/// A persisted open-menu record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRow {
    pub user_id: i64,
    pub chat_id: i64,
    pub message_id: i32,
    /// Unix timestamp in milliseconds of the last open or navigate.
    pub last_activity: i64,
}

/// Menu state store with SQLite backend.
pub struct MenuStore {
    conn: Connection,
}

impl MenuStore {
    /// Open or create the menu database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;

        info!("Help menu store opened: {}", path.display());
        Ok(store)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS help_menus (
                user_id INTEGER PRIMARY KEY,
                chat_id INTEGER NOT NULL,
                message_id INTEGER NOT NULL,
                last_activity INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    /// Create or replace the row for a user.
    pub fn upsert(
        &self,
        user_id: i64,
        chat_id: i64,
        message_id: i32,
        last_activity: i64,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO help_menus (user_id, chat_id, message_id, last_activity)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                chat_id = excluded.chat_id,
                message_id = excluded.message_id,
                last_activity = excluded.last_activity
            "#,
            params![user_id, chat_id, message_id, last_activity],
        )?;

        debug!("Persisted help menu for user {}", user_id);
        Ok(())
    }

    /// Remove a user's row. Returns whether a row existed.
    pub fn delete(&self, user_id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM help_menus WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(rows > 0)
    }

    /// Load every persisted menu row, for the startup recovery pass.
    pub fn load_all(&self) -> Result<Vec<MenuRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, chat_id, message_id, last_activity
             FROM help_menus
             ORDER BY user_id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MenuRow {
                    user_id: row.get(0)?,
                    chat_id: row.get(1)?,
                    message_id: row.get(2)?,
                    last_activity: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }
}
