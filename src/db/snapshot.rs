//! JSON snapshot of the item collection, the local fallback consulted
//! when the remote fetch fails at startup.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::connection::Database;
use crate::domain::Item;
use crate::errors::ServerError;

/// Overwrite the single snapshot row with the current collection.
pub fn save_snapshot(db: &Database, items: &[Item]) -> Result<(), ServerError> {
    let payload = serde_json::to_string(items)
        .map_err(|e| ServerError::DbError(format!("Snapshot serialize failed: {e}")))?;
    let now = Utc::now().naive_utc();

    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO item_snapshot (id, payload, saved_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            "#,
            params![payload, now],
        )
        .map_err(|e| ServerError::DbError(format!("Snapshot write failed: {e}")))?;
        Ok(())
    })
}

/// Load the last snapshot, if one was ever written.
pub fn load_snapshot(db: &Database) -> Result<Option<Vec<Item>>, ServerError> {
    let payload: Option<String> = db.with_conn(|conn| {
        conn.query_row("SELECT payload FROM item_snapshot WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| ServerError::DbError(format!("Snapshot read failed: {e}")))
    })?;

    match payload {
        Some(json) => {
            let items = serde_json::from_str(&json)
                .map_err(|e| ServerError::DbError(format!("Snapshot parse failed: {e}")))?;
            Ok(Some(items))
        }
        None => Ok(None),
    }
}
