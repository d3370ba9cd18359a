//! Shift job board: dispatch, status changes, and briefings.

mod controller;
pub mod roster;
pub mod state;

pub use controller::{JobAction, JobEngine, JobUpdate};
pub use roster::sample_board;
pub use state::{Job, JobBoard, JobCounts, JobPriority, JobStatus};
