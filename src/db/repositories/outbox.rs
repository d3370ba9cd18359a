use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{
        format_datetime, parse_datetime, parse_delivery_status, parse_json,
        parse_optional_datetime, to_i64, to_u32,
    },
    models::{DeliveryStatus, OutboxEntry},
};

const OUTBOX_COLUMNS: &str =
    "id, key, payload, status, attempts, last_error, created_at, delivered_at";

fn row_to_entry(row: &Row) -> Result<OutboxEntry> {
    let payload: String = row.get("payload")?;
    let status: String = row.get("status")?;
    let attempts: i64 = row.get("attempts")?;
    let created_at: String = row.get("created_at")?;
    let delivered_at: Option<String> = row.get("delivered_at")?;

    Ok(OutboxEntry {
        id: row.get("id")?,
        key: row.get("key")?,
        payload: parse_json(&payload, "payload")?,
        status: parse_delivery_status(&status)?,
        attempts: to_u32(attempts, "attempts")?,
        last_error: row.get("last_error")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        delivered_at: parse_optional_datetime(delivered_at, "delivered_at")?,
    })
}

impl Database {
    pub async fn insert_outbox_entry(&self, entry: &OutboxEntry) -> Result<()> {
        let record = entry.clone();
        let payload =
            serde_json::to_string(&record.payload).context("failed to serialize payload")?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO outbox (id, key, payload, status, attempts, last_error, created_at, delivered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.key,
                    payload,
                    record.status.as_str(),
                    i64::from(record.attempts),
                    record.last_error,
                    format_datetime(record.created_at),
                    record.delivered_at.map(format_datetime),
                ],
            )
            .with_context(|| "failed to insert outbox entry")?;
            Ok(())
        })
        .await
    }

    /// Oldest pending entries first, in insertion order.
    pub async fn pending_outbox_entries(&self, limit: usize) -> Result<Vec<OutboxEntry>> {
        let limit = to_i64(limit as u64)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OUTBOX_COLUMNS} FROM outbox
                 WHERE status = ?1
                 ORDER BY seq ASC
                 LIMIT ?2"
            ))?;

            let mut rows = stmt.query(params![DeliveryStatus::Pending.as_str(), limit])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            Ok(entries)
        })
        .await
    }

    pub async fn outbox_entries_for_key(&self, key: &str) -> Result<Vec<OutboxEntry>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {OUTBOX_COLUMNS} FROM outbox WHERE key = ?1 ORDER BY seq ASC"
            ))?;

            let mut rows = stmt.query(params![key])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            Ok(entries)
        })
        .await
    }

    pub async fn count_pending_outbox(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM outbox WHERE status = ?1",
                params![DeliveryStatus::Pending.as_str()],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    /// Marks acknowledged entries delivered and counts one attempt for each.
    pub async fn mark_outbox_delivered(
        &self,
        ids: &[String],
        delivered_at: DateTime<Utc>,
    ) -> Result<usize> {
        let ids = ids.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let mut updated = 0;
            {
                let mut stmt = tx.prepare(
                    "UPDATE outbox
                     SET status = ?1,
                         attempts = attempts + 1,
                         last_error = NULL,
                         delivered_at = ?2
                     WHERE id = ?3 AND status = ?4",
                )?;
                for id in &ids {
                    updated += stmt.execute(params![
                        DeliveryStatus::Delivered.as_str(),
                        format_datetime(delivered_at),
                        id,
                        DeliveryStatus::Pending.as_str(),
                    ])?;
                }
            }
            tx.commit().context("failed to commit delivery acknowledgements")?;
            Ok(updated)
        })
        .await
    }

    /// Counts a failed attempt; entries stay pending for the next sync.
    pub async fn record_outbox_failure(&self, ids: &[String], error: &str) -> Result<()> {
        let ids = ids.to_vec();
        let error = error.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "UPDATE outbox
                     SET attempts = attempts + 1,
                         last_error = ?1
                     WHERE id = ?2 AND status = ?3",
                )?;
                for id in &ids {
                    stmt.execute(params![error, id, DeliveryStatus::Pending.as_str()])?;
                }
            }
            tx.commit().context("failed to commit delivery failures")?;
            Ok(())
        })
        .await
    }

    pub async fn prune_delivered_outbox(&self, delivered_before: DateTime<Utc>) -> Result<usize> {
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM outbox WHERE status = ?1 AND delivered_at < ?2",
                params![
                    DeliveryStatus::Delivered.as_str(),
                    format_datetime(delivered_before)
                ],
            )?;
            Ok(removed)
        })
        .await
    }
}
