use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    #[default]
    Dashboard,
    Inspection,
    Jobs,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Inspection => "Inspection",
            View::Jobs => "Jobs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    Navigate(View),
    ReadView,
    Unrecognized,
}

const KEYWORDS: &[(&[&str], VoiceCommand)] = &[
    (&["dashboard", "panel"], VoiceCommand::Navigate(View::Dashboard)),
    (&["inspection", "check"], VoiceCommand::Navigate(View::Inspection)),
    (&["job", "work"], VoiceCommand::Navigate(View::Jobs)),
    (&["read", "speak"], VoiceCommand::ReadView),
];

/// Keyword match on the lowercased transcript; earlier rows win.
pub fn parse_command(transcript: &str) -> VoiceCommand {
    let transcript = transcript.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|word| transcript.contains(word)))
        .map(|(_, command)| *command)
        .unwrap_or(VoiceCommand::Unrecognized)
}
