//! Safety alerts read out by priority.

mod monitor;
pub mod state;

pub use monitor::{standard_alerts, AlertMonitor};
pub use state::{AlertBoard, AlertLevel, SafetyAlert};
