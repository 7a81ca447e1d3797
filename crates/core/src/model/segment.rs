use serde::{Deserialize, Serialize};

use super::speaker::SpeakerId;
use super::word::Word;
use crate::shared::constants::TIME_EPSILON;

/// A contiguous, time-aligned span of transcript text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<SpeakerId>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            start,
            end,
            text: text.into(),
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

    /// True when the word's span lies within (or equals) this segment's span.
    pub fn contains(&self, word: &Word) -> bool {
        word.start >= self.start - TIME_EPSILON && word.end <= self.end + TIME_EPSILON
    }
}
