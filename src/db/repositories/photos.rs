use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{connection::Database, helpers::{format_datetime, parse_datetime}, models::PhotoEvidence};

fn row_to_photo(row: &Row) -> Result<PhotoEvidence> {
    let captured_at: String = row.get("captured_at")?;
    let width: i64 = row.get("width")?;
    let height: i64 = row.get("height")?;

    Ok(PhotoEvidence {
        id: row.get("id")?,
        check_id: row.get("check_id")?,
        captured_at: parse_datetime(&captured_at, "captured_at")?,
        format: row.get("format")?,
        width: u32::try_from(width).context("width out of range")?,
        height: u32::try_from(height).context("height out of range")?,
        phash: row.get("phash")?,
        duplicate_of: row.get("duplicate_of")?,
        bytes: row.get("bytes")?,
    })
}

impl Database {
    pub async fn insert_photo(&self, photo: &PhotoEvidence) -> Result<()> {
        let record = photo.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO photos (id, check_id, captured_at, format, width, height, phash, duplicate_of, bytes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    record.check_id,
                    format_datetime(record.captured_at),
                    record.format,
                    i64::from(record.width),
                    i64::from(record.height),
                    record.phash,
                    record.duplicate_of,
                    record.bytes,
                ],
            )
            .with_context(|| "failed to insert photo")?;
            Ok(())
        })
        .await
    }

    pub async fn photos_for_check(&self, check_id: &str) -> Result<Vec<PhotoEvidence>> {
        let check_id = check_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, check_id, captured_at, format, width, height, phash, duplicate_of, bytes
                 FROM photos
                 WHERE check_id = ?1
                 ORDER BY captured_at ASC, rowid ASC",
            )?;

            let mut rows = stmt.query(params![check_id])?;
            let mut photos = Vec::new();
            while let Some(row) = rows.next()? {
                photos.push(row_to_photo(row)?);
            }
            Ok(photos)
        })
        .await
    }
}
