use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable speaker identifier: providers use either integers or labels such as `"A"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeakerId {
    Int(i64),
    Text(String),
}

impl SpeakerId {
    /// Integer form of the id, parsing textual ids that hold a number.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SpeakerId::Int(n) => Some(*n),
            SpeakerId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeakerId::Int(n) => write!(f, "{n}"),
            SpeakerId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for SpeakerId {
    fn from(n: i64) -> Self {
        SpeakerId::Int(n)
    }
}

impl From<i32> for SpeakerId {
    fn from(n: i32) -> Self {
        SpeakerId::Int(n.into())
    }
}

impl From<&str> for SpeakerId {
    fn from(s: &str) -> Self {
        SpeakerId::Text(s.to_string())
    }
}

impl From<String> for SpeakerId {
    fn from(s: String) -> Self {
        SpeakerId::Text(s)
    }
}

/// A diarized speaker. Segments and words refer to it by id only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: SpeakerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Speaker {
    pub fn new(id: impl Into<SpeakerId>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
