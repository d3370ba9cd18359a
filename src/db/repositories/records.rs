use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_json},
    models::PersistedRecord,
};

impl Database {
    /// Replaces the payload stored under `key` in a single statement, so a
    /// failed write leaves the previous payload untouched.
    pub async fn upsert_record(
        &self,
        key: &str,
        payload: &Value,
        saved_at: DateTime<Utc>,
    ) -> Result<()> {
        let key = key.to_string();
        let payload = serde_json::to_string(payload).context("failed to serialize payload")?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO records (key, payload, saved_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     payload = excluded.payload,
                     saved_at = excluded.saved_at",
                params![key, payload, format_datetime(saved_at)],
            )
            .with_context(|| format!("failed to upsert record {key}"))?;
            Ok(())
        })
        .await
    }

    pub async fn get_record(&self, key: &str) -> Result<Option<PersistedRecord>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT key, payload, saved_at FROM records WHERE key = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(key, payload, saved_at)| {
                Ok(PersistedRecord {
                    payload: parse_json(&payload, "payload")?,
                    saved_at: parse_datetime(&saved_at, "saved_at")?,
                    key,
                })
            })
            .transpose()
        })
        .await
    }
}
