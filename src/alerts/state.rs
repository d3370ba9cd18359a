use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Danger,
    Warning,
    Info,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Danger => "danger",
            AlertLevel::Warning => "warning",
            AlertLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAlert {
    pub id: u32,
    pub level: AlertLevel,
    pub message: String,
    /// Higher is more urgent.
    pub priority: u8,
    pub raised_at: DateTime<Utc>,
}

/// Active alerts plus the ids already read out to the operator.
#[derive(Debug, Clone, Default)]
pub struct AlertBoard {
    alerts: Vec<SafetyAlert>,
    spoken: HashSet<u32>,
}

impl AlertBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn raise(&mut self, alert: SafetyAlert) {
        self.spoken.remove(&alert.id);
        self.alerts.retain(|existing| existing.id != alert.id);
        self.alerts.push(alert);
    }

    pub fn dismiss(&mut self, id: u32) -> Option<SafetyAlert> {
        let index = self.alerts.iter().position(|alert| alert.id == id)?;
        self.spoken.remove(&id);
        Some(self.alerts.remove(index))
    }

    pub fn get(&self, id: u32) -> Option<&SafetyAlert> {
        self.alerts.iter().find(|alert| alert.id == id)
    }

    /// Most urgent first; equal priorities keep the order they were raised in.
    pub fn sorted(&self) -> Vec<SafetyAlert> {
        let mut sorted = self.alerts.clone();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        sorted
    }

    /// The most urgent alert the operator has not heard yet.
    pub fn priority_alert(&self) -> Option<SafetyAlert> {
        self.sorted()
            .into_iter()
            .find(|alert| !self.spoken.contains(&alert.id))
    }

    pub fn is_spoken(&self, id: u32) -> bool {
        self.spoken.contains(&id)
    }

    pub fn mark_spoken(&mut self, id: u32) {
        if self.get(id).is_some() {
            self.spoken.insert(id);
        }
    }

    pub fn mark_all_spoken(&mut self) {
        self.spoken = self.alerts.iter().map(|alert| alert.id).collect();
    }

    /// "<N> active alerts: a. b. c", most urgent first.
    pub fn summary(&self) -> String {
        if self.alerts.is_empty() {
            return "No active alerts".to_string();
        }
        let messages: Vec<String> = self
            .sorted()
            .into_iter()
            .map(|alert| alert.message)
            .collect();
        format!("{} active alerts: {}", messages.len(), messages.join(". "))
    }
}
