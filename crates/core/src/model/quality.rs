use serde::{Deserialize, Serialize};

use super::document::Document;
use crate::shared::constants::LOW_CONFIDENCE_THRESHOLD;
use crate::shared::math::{covered_length, mean};

/// Metrics derived from a document's confidences and timing.
///
/// Fields are read-only; the only way to build one is [`Quality::compute`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    mean_confidence: f64,
    min_confidence: f64,
    max_confidence: f64,
    low_confidence_count: usize,
    token_count: usize,
    completeness: f64,
}

impl Quality {
    /// Derive metrics from word confidences, falling back to segment confidences and then the
    /// transcript's overall confidence when no finer tokens exist.
    ///
    /// `completeness` is the share of `[0, duration]` covered by segment spans (word spans
    /// when there are no segments); `0.0` for a zero-length transcript.
    pub fn compute(doc: &Document) -> Self {
        let confidences: Vec<f64> = if !doc.words.is_empty() {
            doc.words.iter().map(|w| w.confidence).collect()
        } else if !doc.segments.is_empty() {
            doc.segments.iter().map(|s| s.confidence).collect()
        } else {
            vec![doc.transcript.confidence]
        };

        let min_confidence = confidences.iter().copied().fold(f64::INFINITY, f64::min);
        let max_confidence = confidences.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low_confidence_count = confidences
            .iter()
            .filter(|&&c| c < LOW_CONFIDENCE_THRESHOLD)
            .count();

        let spans: Vec<(f64, f64)> = if !doc.segments.is_empty() {
            doc.segments.iter().map(|s| (s.start, s.end)).collect()
        } else {
            doc.words.iter().map(|w| (w.start, w.end)).collect()
        };
        let duration = doc.transcript.duration;
        let completeness = if duration > 0.0 {
            (covered_length(&spans, duration) / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            mean_confidence: mean(&confidences).unwrap_or(0.0),
            min_confidence,
            max_confidence,
            low_confidence_count,
            token_count: confidences.len(),
            completeness,
        }
    }

    pub fn mean_confidence(&self) -> f64 {
        self.mean_confidence
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn max_confidence(&self) -> f64 {
        self.max_confidence
    }

    pub fn low_confidence_count(&self) -> usize {
        self.low_confidence_count
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn completeness(&self) -> f64 {
        self.completeness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Segment, Transcript, Word};
    use approx::assert_relative_eq;

    fn doc() -> Document {
        Document::new(Transcript::new("hello world again", "en-US", 4.0, 0.8))
            .with_segments(vec![
                Segment::new(0.0, 1.0, "hello", 0.9),
                Segment::new(2.0, 4.0, "world again", 0.7),
            ])
            .with_words(vec![
                Word::new("hello", 0.0, 1.0, 0.9),
                Word::new("world", 2.0, 3.0, 0.4),
                Word::new("again", 3.0, 4.0, 0.8),
            ])
    }

    #[test]
    fn test_word_confidences_drive_metrics() {
        let q = Quality::compute(&doc());
        assert_eq!(q.token_count(), 3);
        assert_eq!(q.low_confidence_count(), 1);
        assert_relative_eq!(q.mean_confidence(), 0.7, epsilon = 1e-9);
        assert_relative_eq!(q.min_confidence(), 0.4);
        assert_relative_eq!(q.max_confidence(), 0.9);
    }

    #[test]
    fn test_completeness_counts_gaps() {
        let q = Quality::compute(&doc());
        assert_relative_eq!(q.completeness(), 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_falls_back_to_segments() {
        let d = Document { words: Vec::new(), ..doc() };
        let q = Quality::compute(&d);
        assert_eq!(q.token_count(), 2);
        assert_relative_eq!(q.mean_confidence(), 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_falls_back_to_transcript_confidence() {
        let d = Document::new(Transcript::new("", "en-US", 0.0, 0.3));
        let q = Quality::compute(&d);
        assert_eq!(q.token_count(), 1);
        assert_eq!(q.low_confidence_count(), 1);
        assert_relative_eq!(q.mean_confidence(), 0.3);
        assert_eq!(q.completeness(), 0.0);
    }
}
