use crate::navigation::Coordinates;

use super::state::{Job, JobBoard, JobPriority, JobStatus};

#[allow(clippy::too_many_arguments)]
fn job(
    id: u32,
    title: &str,
    location: &str,
    destination: &str,
    status: JobStatus,
    priority: JobPriority,
    eta: &str,
    load_type: &str,
    estimated_weight: &str,
    description: &str,
    coordinates: Coordinates,
) -> Job {
    Job {
        id,
        title: title.into(),
        location: location.into(),
        destination: destination.into(),
        priority,
        status,
        coordinates,
        eta: Some(eta.into()),
        load_type: Some(load_type.into()),
        estimated_weight: Some(estimated_weight.into()),
        description: Some(description.into()),
    }
}

/// Demo dispatch used until the backend pushes a real one.
pub fn sample_board() -> JobBoard {
    use JobPriority::*;
    use JobStatus::*;

    JobBoard::new(vec![
        job(
            1,
            "Excavation Site A - Load Transport",
            "North Quarry Section 3",
            "Processing Plant B",
            Pending,
            High,
            "08:30 AM",
            "Limestone",
            "25 tons",
            "Transport limestone from excavation site to processing plant",
            Coordinates::new(9.9210, 78.0967),
        ),
        job(
            2,
            "Equipment Maintenance Area",
            "Service Bay 2",
            "Field Station C",
            InProgress,
            Medium,
            "10:15 AM",
            "Maintenance Equipment",
            "8 tons",
            "Transport maintenance equipment to field station",
            Coordinates::new(9.9215, 78.0970),
        ),
        job(
            3,
            "Aggregate Delivery",
            "Storage Yard D",
            "Construction Site E",
            Completed,
            Low,
            "02:00 PM",
            "Gravel Mix",
            "30 tons",
            "Deliver gravel mix to construction site",
            Coordinates::new(9.9205, 78.0965),
        ),
        job(
            4,
            "Waste Material Removal",
            "Demolition Site F",
            "Disposal Facility",
            Pending,
            High,
            "03:30 PM",
            "Concrete Debris",
            "22 tons",
            "Remove concrete debris from demolition site",
            Coordinates::new(9.9200, 78.0975),
        ),
        job(
            5,
            "Sand Transport",
            "Riverside Quarry",
            "Concrete Plant",
            Pending,
            Medium,
            "04:00 PM",
            "Fine Sand",
            "18 tons",
            "Transport fine sand for concrete production",
            Coordinates::new(9.9220, 78.0960),
        ),
        job(
            6,
            "Rock Crushing Site",
            "Mountain Quarry A",
            "Storage Facility B",
            Pending,
            Low,
            "05:30 PM",
            "Crushed Rock",
            "35 tons",
            "Move crushed rock to storage facility",
            Coordinates::new(9.9225, 78.0955),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_board_counts() {
        let board = sample_board();
        let counts = board.counts();
        assert_eq!((counts.pending, counts.in_progress, counts.completed), (4, 1, 1));
        assert_eq!(
            board.next_priority_pending().map(|job| job.id),
            Some(1)
        );
    }
}
