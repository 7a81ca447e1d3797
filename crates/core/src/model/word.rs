use serde::{Deserialize, Serialize};

use super::speaker::SpeakerId;

/// Finest-grained time-aligned token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<SpeakerId>,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64, confidence: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence,
            speaker: None,
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<SpeakerId>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
