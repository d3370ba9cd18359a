use std::collections::HashMap;
use std::sync::RwLock;

/// Region read when the caller names none.
pub const PRIMARY_REGION: &str = "main";
/// Whole-view fallback when the requested region is not on screen.
pub const WHOLE_VIEW: &str = "body";

/// Supplies the text currently visible in a named region of the active view.
pub trait ViewTextSource: Send + Sync {
    fn visible_text(&self, region: &str) -> Option<String>;
}

/// View text published by whatever renders the screen.
#[derive(Default)]
pub struct ViewSnapshots {
    regions: RwLock<HashMap<String, String>>,
}

impl ViewSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, region: impl Into<String>, text: impl Into<String>) {
        let mut regions = self
            .regions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        regions.insert(region.into(), text.into());
    }
}

impl ViewTextSource for ViewSnapshots {
    fn visible_text(&self, region: &str) -> Option<String> {
        let regions = self
            .regions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        regions.get(region).cloned()
    }
}
