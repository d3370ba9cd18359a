use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::navigation::Coordinates;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    Low,
    Medium,
    High,
}

impl JobPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            JobPriority::Low => "low",
            JobPriority::Medium => "medium",
            JobPriority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u32,
    pub title: String,
    pub location: String,
    pub destination: String,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub load_type: Option<String>,
    #[serde(default)]
    pub estimated_weight: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Job {
    pub fn details_announcement(&self) -> String {
        format!(
            "Job details: {}. Location: {}. Destination: {}. Load type: {}. Priority: {}",
            self.title,
            self.location,
            self.destination,
            self.load_type.as_deref().unwrap_or("unknown"),
            self.priority.as_str()
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// The shift's jobs in dispatch order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct JobBoard {
    jobs: Vec<Job>,
}

impl JobBoard {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, id: u32) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    fn get_mut(&mut self, id: u32) -> Result<&mut Job> {
        self.jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| anyhow!("unknown job {id}"))
    }

    /// Pending → InProgress.
    pub fn start(&mut self, id: u32) -> Result<&Job> {
        self.transition(id, JobStatus::Pending, JobStatus::InProgress)
    }

    /// InProgress → Completed.
    pub fn complete(&mut self, id: u32) -> Result<&Job> {
        self.transition(id, JobStatus::InProgress, JobStatus::Completed)
    }

    fn transition(&mut self, id: u32, from: JobStatus, to: JobStatus) -> Result<&Job> {
        let job = self.get_mut(id)?;
        if job.status != from {
            bail!(
                "job {id} is {}, expected {}",
                job.status.as_str(),
                from.as_str()
            );
        }
        job.status = to;
        Ok(job)
    }

    pub fn counts(&self) -> JobCounts {
        self.jobs.iter().fold(JobCounts::default(), |mut counts, job| {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::InProgress => counts.in_progress += 1,
                JobStatus::Completed => counts.completed += 1,
            }
            counts
        })
    }

    /// Jobs flagged High that are not completed yet.
    pub fn high_priority_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.priority == JobPriority::High && job.status != JobStatus::Completed)
            .count()
    }

    /// First pending High job in dispatch order.
    pub fn next_priority_pending(&self) -> Option<&Job> {
        self.jobs
            .iter()
            .find(|job| job.status == JobStatus::Pending && job.priority == JobPriority::High)
    }

    pub fn briefing_summary(&self) -> String {
        let counts = self.counts();
        format!(
            "Job briefing summary: {} pending jobs, {} jobs in progress, {} completed jobs. Next priority job: {}",
            counts.pending,
            counts.in_progress,
            counts.completed,
            self.next_priority_pending()
                .map(|job| job.title.as_str())
                .unwrap_or("None")
        )
    }
}
