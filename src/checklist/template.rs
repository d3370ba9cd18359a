use uuid::Uuid;

use super::state::{Inspection, Section};

/// Default pre-operation walkaround for heavy equipment.
pub fn pre_operation_inspection() -> Inspection {
    Inspection::new(
        format!("insp_{}", Uuid::new_v4()),
        vec![
            Section::new("tires", "Tires and Tracks")
                .check("tire-pressure", "Tire pressure within spec")
                .check("tire-damage", "No cuts or bulges on sidewalls")
                .check("track-tension", "Track tension correct"),
            Section::new("hydraulics", "Hydraulics")
                .check("hyd-fluid", "Hydraulic fluid level")
                .check("hyd-leaks", "No hydraulic leaks at hoses and cylinders"),
            Section::new("engine", "Engine")
                .check("engine-oil", "Engine oil level")
                .check("coolant", "Coolant level")
                .check("air-filter", "Air filter indicator clear"),
            Section::new("safety", "Safety Equipment")
                .check("fire-extinguisher", "Fire extinguisher charged")
                .check("seat-belt", "Seat belt latches")
                .check("backup-alarm", "Backup alarm sounds"),
            Section::new("cab", "Cab and Controls")
                .check("mirrors", "Mirrors clean and adjusted")
                .check("gauges", "Gauges and warning lights working"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::checklist::state::CheckStatus;

    #[test]
    fn template_starts_untouched() {
        let insp = pre_operation_inspection();
        assert_eq!(insp.sections.len(), 5);
        assert!(insp.checks().all(|check| check.status == CheckStatus::NotStarted));
        assert_eq!(insp.progress(), 0.0);
    }

    #[test]
    fn check_ids_are_unique_and_owned_by_their_section() {
        let insp = pre_operation_inspection();
        let mut seen = HashSet::new();
        for section in &insp.sections {
            for check in &section.checks {
                assert!(seen.insert(check.id.clone()), "duplicate id {}", check.id);
                assert_eq!(check.section_id, section.id);
            }
        }
    }
}
