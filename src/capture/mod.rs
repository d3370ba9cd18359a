//! Photo evidence attached to inspection checks.

pub mod phash;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use uuid::Uuid;

use crate::{capabilities::Capability, db::Database, db::PhotoEvidence, narration::NarrationService};

use phash::{decode_photo, hamming_distance};

#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

/// Device camera. `capture` may block until the shutter fires.
pub trait Camera: Send + Sync {
    fn capture(&self) -> Result<CapturedImage>;
}

#[derive(Clone)]
pub struct PhotoLog {
    db: Database,
    narration: NarrationService,
    duplicate_threshold: u32,
}

impl PhotoLog {
    pub fn new(db: Database, narration: NarrationService, duplicate_threshold: u32) -> Self {
        Self {
            db,
            narration,
            duplicate_threshold,
        }
    }

    /// Stores an uploaded photo for `check_id`. Non-image data is rejected
    /// with a spoken "Invalid file selected".
    pub async fn attach(&self, check_id: &str, bytes: Vec<u8>) -> Result<PhotoEvidence> {
        self.attach_at(check_id, bytes, Utc::now()).await
    }

    /// Takes a photo with the device camera and stores it.
    pub async fn capture_from(
        &self,
        camera: &Capability<dyn Camera>,
        check_id: &str,
    ) -> Result<PhotoEvidence> {
        let Some(camera) = camera.get().cloned() else {
            self.narration.speak("Camera not available");
            return Err(anyhow!("no camera on this device"));
        };

        let shot = tokio::task::spawn_blocking(move || camera.capture())
            .await
            .context("camera task failed to join")?;
        let shot = match shot {
            Ok(shot) => shot,
            Err(err) => {
                self.narration.speak("Camera not available");
                return Err(err.context("camera capture failed"));
            }
        };

        self.attach_at(check_id, shot.bytes, shot.captured_at).await
    }

    pub async fn photos_for(&self, check_id: &str) -> Result<Vec<PhotoEvidence>> {
        self.db.photos_for_check(check_id).await
    }

    async fn attach_at(
        &self,
        check_id: &str,
        bytes: Vec<u8>,
        captured_at: DateTime<Utc>,
    ) -> Result<PhotoEvidence> {
        let (decoded, bytes) = tokio::task::spawn_blocking(move || {
            let decoded = decode_photo(&bytes);
            (decoded, bytes)
        })
        .await
        .context("photo decode task failed to join")?;

        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!("Rejected photo for check {check_id}: {err:?}");
                self.narration.speak("Invalid file selected");
                return Err(err);
            }
        };

        let earlier = self.db.photos_for_check(check_id).await?;
        let duplicate_of = earlier
            .iter()
            .find(|photo| hamming_distance(&photo.phash, &decoded.phash) <= self.duplicate_threshold)
            .map(|photo| photo.id.clone());

        let photo = PhotoEvidence {
            id: format!("ph_{}", Uuid::new_v4()),
            check_id: check_id.to_string(),
            captured_at,
            format: decoded.format,
            width: decoded.width,
            height: decoded.height,
            phash: decoded.phash,
            duplicate_of,
            bytes,
        };

        self.db.insert_photo(&photo).await?;

        match &photo.duplicate_of {
            Some(original) => info!(
                "Photo {} for check {check_id} looks like a retake of {original}",
                photo.id
            ),
            None => info!(
                "Saved {}x{} {} photo for check {check_id}",
                photo.width, photo.height, photo.format
            ),
        }

        self.narration.speak("Photo saved");
        Ok(photo)
    }
}
