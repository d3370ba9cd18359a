use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo attached to an inspection check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoEvidence {
    pub id: String,
    pub check_id: String,
    pub captured_at: DateTime<Utc>,
    /// Lowercase image format name, e.g. `jpeg`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Base64 perceptual hash used to spot retakes of the same shot.
    pub phash: String,
    /// Earlier photo of the same check this one nearly duplicates.
    pub duplicate_of: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}
