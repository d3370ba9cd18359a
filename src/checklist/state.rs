use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CheckStatus {
    #[default]
    NotStarted,
    Completed,
    Failed,
}

impl CheckStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CheckStatus::Completed | CheckStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InspectionOutcome {
    Passed,
    Failed,
}

impl InspectionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            InspectionOutcome::Passed => "passed",
            InspectionOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectionCheck {
    pub id: String,
    pub section_id: String,
    /// What the operator is asked to verify; read aloud during walkthroughs.
    pub prompt: String,
    #[serde(default)]
    pub status: CheckStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl InspectionCheck {
    pub fn new(id: impl Into<String>, section_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            section_id: section_id.into(),
            prompt: prompt.into(),
            status: CheckStatus::NotStarted,
            note: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub checks: Vec<InspectionCheck>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            checks: Vec::new(),
        }
    }

    /// Appends a check owned by this section.
    pub fn check(mut self, id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let check = InspectionCheck::new(id, self.id.clone(), prompt);
        self.checks.push(check);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: String,
    pub sections: Vec<Section>,
    pub started_at: DateTime<Utc>,
}

impl Inspection {
    pub fn new(id: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            id: id.into(),
            sections,
            started_at: Utc::now(),
        }
    }

    pub fn checks(&self) -> impl Iterator<Item = &InspectionCheck> {
        self.sections.iter().flat_map(|section| section.checks.iter())
    }

    pub fn total_checks(&self) -> usize {
        self.checks().count()
    }

    pub fn terminal_checks(&self) -> usize {
        self.checks().filter(|check| check.status.is_terminal()).count()
    }

    /// Every check is terminal. An inspection without checks is never complete.
    pub fn is_complete(&self) -> bool {
        self.total_checks() > 0 && self.checks().all(|check| check.status.is_terminal())
    }

    /// Share of checks in a terminal state, 0–100. An empty inspection has no progress.
    pub fn progress(&self) -> f64 {
        let total = self.total_checks();
        if total == 0 {
            return 0.0;
        }
        self.terminal_checks() as f64 / total as f64 * 100.0
    }

    /// Progress rounded for display.
    pub fn progress_percent(&self) -> u8 {
        self.progress().round().clamp(0.0, 100.0) as u8
    }

    /// `None` until every check is terminal, and always `None` for an empty inspection.
    pub fn outcome(&self) -> Option<InspectionOutcome> {
        if !self.is_complete() {
            return None;
        }
        if self.checks().any(|check| check.status == CheckStatus::Failed) {
            Some(InspectionOutcome::Failed)
        } else {
            Some(InspectionOutcome::Passed)
        }
    }

    pub fn check(&self, check_id: &str) -> Option<&InspectionCheck> {
        self.checks().find(|check| check.id == check_id)
    }

    fn check_mut(&mut self, check_id: &str) -> Result<&mut InspectionCheck> {
        self.sections
            .iter_mut()
            .flat_map(|section| section.checks.iter_mut())
            .find(|check| check.id == check_id)
            .ok_or_else(|| anyhow!("unknown check '{check_id}'"))
    }

    /// NotStarted → Completed | Failed. Terminal checks only move again through [`Self::reset`].
    pub fn record_result(
        &mut self,
        check_id: &str,
        status: CheckStatus,
        at: DateTime<Utc>,
    ) -> Result<&InspectionCheck> {
        if !status.is_terminal() {
            bail!("a check can only be marked completed or failed");
        }

        let check = self.check_mut(check_id)?;
        if check.status.is_terminal() {
            bail!(
                "check '{check_id}' is already {:?}; reset it before re-inspecting",
                check.status
            );
        }

        check.status = status;
        check.completed_at = Some(at);
        Ok(check)
    }

    pub fn add_note(&mut self, check_id: &str, note: &str) -> Result<&InspectionCheck> {
        let check = self.check_mut(check_id)?;
        let note = note.trim();
        check.note = if note.is_empty() {
            None
        } else {
            Some(note.to_string())
        };
        Ok(check)
    }

    /// Returns a terminal check to NotStarted for re-inspection; the note is kept.
    pub fn reset(&mut self, check_id: &str) -> Result<&InspectionCheck> {
        let check = self.check_mut(check_id)?;
        if !check.status.is_terminal() {
            bail!("check '{check_id}' has not been inspected yet");
        }
        check.status = CheckStatus::NotStarted;
        check.completed_at = None;
        Ok(check)
    }
}

/// The inspection plus the section the operator is looking at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistState {
    pub inspection: Inspection,
    pub current_section: usize,
    /// Set once the inspection has been finalized; it cannot be finalized again.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChecklistState {
    pub fn new(inspection: Inspection) -> Self {
        Self {
            inspection,
            current_section: 0,
            completed_at: None,
        }
    }

    /// Latches completion and returns the outcome.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) -> Result<InspectionOutcome> {
        if let Some(completed_at) = self.completed_at {
            bail!(
                "inspection '{}' was already completed at {completed_at}",
                self.inspection.id
            );
        }

        let total = self.inspection.total_checks();
        if total == 0 {
            bail!("inspection '{}' has no checks", self.inspection.id);
        }
        let outcome = self.inspection.outcome().ok_or_else(|| {
            anyhow!(
                "{} of {total} checks still need inspecting",
                total - self.inspection.terminal_checks()
            )
        })?;

        self.completed_at = Some(at);
        Ok(outcome)
    }

    pub fn current(&self) -> Option<&Section> {
        self.inspection.sections.get(self.current_section)
    }

    fn last_index(&self) -> usize {
        self.inspection.sections.len().saturating_sub(1)
    }

    /// Moves forward one section, stopping at the last; returns whether it moved.
    pub fn advance(&mut self) -> bool {
        let next = (self.current_section + 1).min(self.last_index());
        let moved = next != self.current_section;
        self.current_section = next;
        moved
    }

    /// Moves back one section, stopping at the first; returns whether it moved.
    pub fn retreat(&mut self) -> bool {
        let previous = self.current_section.saturating_sub(1);
        let moved = previous != self.current_section;
        self.current_section = previous;
        moved
    }

    /// Keeps the pointer inside the section list after a restore.
    pub fn clamp_pointer(&mut self) {
        self.current_section = self.current_section.min(self.last_index());
    }
}
