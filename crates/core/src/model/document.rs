use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::audio::Audio;
use super::extensions::{ExtensionValue, Extensions};
use super::metadata::Metadata;
use super::quality::Quality;
use super::segment::Segment;
use super::speaker::{Speaker, SpeakerId};
use super::transcript::Transcript;
use super::word::Word;
use crate::conversion::domain::conversion_error::ConversionError;

/// A complete canonical transcript.
///
/// Construction never validates; run a [`crate::validation::Validator`] for that.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub transcript: Transcript,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

/// Word indices grouped under the segment that contains them.
#[derive(Clone, Debug, PartialEq)]
pub struct WordAssignment {
    /// One entry per segment, in segment order.
    pub per_segment: Vec<Vec<usize>>,
    /// Words no segment contains, in document order.
    pub unassigned: Vec<usize>,
}

impl WordAssignment {
    /// Containing segment for each word, `None` for unassigned words.
    pub fn placement(&self, word_count: usize) -> Vec<Option<usize>> {
        let mut placement = vec![None; word_count];
        for (segment, words) in self.per_segment.iter().enumerate() {
            for &w in words {
                if let Some(slot) = placement.get_mut(w) {
                    *slot = Some(segment);
                }
            }
        }
        placement
    }
}

impl Document {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            segments: Vec::new(),
            words: Vec::new(),
            speakers: Vec::new(),
            quality: None,
            audio: None,
            metadata: None,
            extensions: Extensions::new(),
        }
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    pub fn with_speakers(mut self, speakers: Vec<Speaker>) -> Self {
        self.speakers = speakers;
        self
    }

    pub fn with_audio(mut self, audio: Audio) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Attach metrics computed from the current contents.
    pub fn with_computed_quality(mut self) -> Self {
        self.quality = Some(Quality::compute(&self));
        self
    }

    pub fn speaker(&self, id: &SpeakerId) -> Option<&Speaker> {
        self.speakers.iter().find(|s| &s.id == id)
    }

    pub fn extension(&self, namespace: &str) -> Option<&ExtensionValue> {
        self.extensions.get(namespace)
    }

    /// Assign each word to the first segment containing it.
    ///
    /// The search resumes from the last matched segment, so ordered input is linear.
    pub fn words_by_segment(&self) -> WordAssignment {
        let mut per_segment: Vec<Vec<usize>> = vec![Vec::new(); self.segments.len()];
        let mut unassigned = Vec::new();
        let mut cursor = 0;

        for (index, word) in self.words.iter().enumerate() {
            let n = self.segments.len();
            let hit = (0..n)
                .map(|offset| (cursor + offset) % n)
                .find(|&i| self.segments[i].contains(word));
            match hit {
                Some(i) => {
                    per_segment[i].push(index);
                    cursor = i;
                }
                None => unassigned.push(index),
            }
        }

        WordAssignment {
            per_segment,
            unassigned,
        }
    }

    pub fn to_value(&self) -> Result<Value, ConversionError> {
        serde_json::to_value(self).map_err(|e| ConversionError::MalformedDocument(e.to_string()))
    }

    pub fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Self::deserialize(value).map_err(|e| ConversionError::MalformedDocument(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, ConversionError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConversionError::MalformedDocument(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample() -> Document {
        let mut extensions = Extensions::new();
        extensions.insert(
            "deepgram".into(),
            ExtensionValue::from(json!({"request_id": "abc"})),
        );
        Document::new(Transcript::new("hello there", "en-US", 3.5, 0.9))
            .with_segments(vec![Segment::new(0.0, 3.5, "hello there", 0.9).with_speaker(0)])
            .with_words(vec![
                Word::new("hello", 0.0, 0.5, 0.95).with_speaker(0),
                Word::new("there", 0.6, 1.0, 0.85).with_speaker(0),
            ])
            .with_speakers(vec![Speaker::new(0).with_label("Speaker 0")])
            .with_audio(Audio::new(3.5).with_sample_rate(16000))
            .with_metadata(
                Metadata::new("deepgram", "nova-2")
                    .with_created_at(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            )
            .with_extensions(extensions)
            .with_computed_quality()
    }

    #[test]
    fn test_value_round_trip() {
        let doc = sample();
        let value = doc.to_value().unwrap();
        assert_eq!(Document::from_value(&value).unwrap(), doc);
    }

    #[test]
    fn test_canonical_keys() {
        let value = sample().to_value().unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "transcript",
            "segments",
            "words",
            "speakers",
            "quality",
            "audio",
            "metadata",
            "extensions",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(value["metadata"]["created_at"], json!("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn test_minimal_document_omits_optional_sections() {
        let value = Document::new(Transcript::new("", "en-US", 0.0, 0.0))
            .to_value()
            .unwrap();
        assert_eq!(
            value,
            json!({
                "transcript": {"text": "", "language": "en-US", "duration": 0.0, "confidence": 0.0},
                "segments": [],
                "words": [],
                "speakers": []
            })
        );
    }

    #[test]
    fn test_from_value_rejects_missing_transcript() {
        let err = Document::from_value(&json!({"segments": []})).unwrap_err();
        assert!(matches!(err, ConversionError::MalformedDocument(_)));
    }

    #[test]
    fn test_speaker_lookup() {
        let doc = sample();
        assert_eq!(
            doc.speaker(&SpeakerId::Int(0)).and_then(|s| s.label.as_deref()),
            Some("Speaker 0")
        );
        assert!(doc.speaker(&SpeakerId::Int(9)).is_none());
    }

    #[test]
    fn test_words_by_segment() {
        let doc = Document::new(Transcript::new("a b c", "en-US", 5.0, 0.9))
            .with_segments(vec![
                Segment::new(0.0, 2.0, "a b", 0.9),
                Segment::new(2.0, 3.0, "c", 0.9),
            ])
            .with_words(vec![
                Word::new("a", 0.0, 0.5, 0.9),
                Word::new("b", 1.0, 1.5, 0.9),
                Word::new("c", 2.2, 2.8, 0.9),
                Word::new("d", 4.0, 4.5, 0.9),
            ]);
        let assignment = doc.words_by_segment();
        assert_eq!(assignment.per_segment, vec![vec![0, 1], vec![2]]);
        assert_eq!(assignment.unassigned, vec![3]);
        assert_eq!(
            assignment.placement(4),
            vec![Some(0), Some(0), Some(1), None]
        );
    }

    #[test]
    fn test_words_without_segments_are_unassigned() {
        let doc = Document::new(Transcript::new("a", "en-US", 1.0, 0.9))
            .with_words(vec![Word::new("a", 0.0, 0.5, 0.9)]);
        let assignment = doc.words_by_segment();
        assert!(assignment.per_segment.is_empty());
        assert_eq!(assignment.unassigned, vec![0]);
    }
}
