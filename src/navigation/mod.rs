//! Straight-line guidance to a job site: distance and bearing from live GPS fixes.

pub mod geo;
mod session;

use anyhow::Result;
use tokio::sync::mpsc;

pub use geo::Coordinates;
pub use session::{NavigationSession, NavigationUpdate, ARRIVED, WAITING_FOR_GPS};

#[derive(Debug, Clone, PartialEq)]
pub enum PositionFix {
    Position(Coordinates),
    Error(String),
}

/// A live position subscription; fixes arrive until the watch is cleared.
pub struct PositionWatch {
    pub id: u64,
    pub fixes: mpsc::Receiver<PositionFix>,
}

/// Device location provider.
pub trait Geolocation: Send + Sync {
    fn watch_position(&self) -> Result<PositionWatch>;
    fn clear_watch(&self, watch_id: u64);
}
