use serde::{Deserialize, Serialize};

/// Top-level summary of a transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// BCP-47 language tag, e.g. `en-US`.
    pub language: String,
    /// Total duration in seconds.
    pub duration: f64,
    /// Overall confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

impl Transcript {
    pub fn new(text: impl Into<String>, language: impl Into<String>, duration: f64, confidence: f64) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            duration,
            confidence,
        }
    }
}
