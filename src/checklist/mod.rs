//! Pre-operation inspection: sections of checks walked through by voice.

mod controller;
pub mod state;
pub mod template;

pub use controller::{ChecklistEngine, CompletionRecord};
pub use state::{
    CheckStatus, ChecklistState, Inspection, InspectionCheck, InspectionOutcome, Section,
};
pub use template::pre_operation_inspection;
