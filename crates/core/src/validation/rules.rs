use std::collections::HashSet;

use crate::model::{Document, SpeakerId};
use crate::normalization::is_valid_bcp47;
use crate::shared::constants::TIME_EPSILON;

/// A single check over a document.
///
/// Rules are independent: each reports its own violations and never panics.
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, doc: &Document) -> Vec<String>;
}

/// The built-in rules in their fixed evaluation order.
pub fn builtin_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(ConfidenceRange),
        Box::new(TimingBounds),
        Box::new(SegmentOrder),
        Box::new(SpeakerReferences),
        Box::new(WordSegmentConsistency),
        Box::new(LanguageTag),
    ]
}

fn in_unit_interval(c: f64) -> bool {
    (0.0..=1.0).contains(&c)
}

pub struct ConfidenceRange;

impl ValidationRule for ConfidenceRange {
    fn name(&self) -> &str {
        "confidence_range"
    }

    fn check(&self, doc: &Document) -> Vec<String> {
        let mut errors = Vec::new();
        if !in_unit_interval(doc.transcript.confidence) {
            errors.push(format!(
                "transcript confidence ({}) must be between 0.0 and 1.0",
                doc.transcript.confidence
            ));
        }
        for (i, s) in doc.segments.iter().enumerate() {
            if !in_unit_interval(s.confidence) {
                errors.push(format!(
                    "segment {i} confidence ({}) must be between 0.0 and 1.0",
                    s.confidence
                ));
            }
        }
        for (i, w) in doc.words.iter().enumerate() {
            if !in_unit_interval(w.confidence) {
                errors.push(format!(
                    "word {i} confidence ({}) must be between 0.0 and 1.0",
                    w.confidence
                ));
            }
        }
        errors
    }
}

/// `0 <= start <= end <= duration` for every segment and word, within [`TIME_EPSILON`].
pub struct TimingBounds;

impl TimingBounds {
    fn check_span(kind: &str, index: usize, start: f64, end: f64, duration: f64) -> Option<String> {
        if !start.is_finite() || !end.is_finite() {
            return Some(format!("{kind} {index} has non-finite timing ({start}, {end})"));
        }
        if start < -TIME_EPSILON {
            return Some(format!("{kind} {index} starts before zero ({start})"));
        }
        if start > end + TIME_EPSILON {
            return Some(format!(
                "{kind} {index}: start time ({start}) must not be after end time ({end})"
            ));
        }
        if end > duration + TIME_EPSILON {
            return Some(format!(
                "{kind} {index} ends at {end}, beyond transcript duration {duration}"
            ));
        }
        None
    }
}

impl ValidationRule for TimingBounds {
    fn name(&self) -> &str {
        "timing_bounds"
    }

    fn check(&self, doc: &Document) -> Vec<String> {
        let duration = doc.transcript.duration;
        let mut errors = Vec::new();
        if !duration.is_finite() || duration < 0.0 {
            errors.push(format!("transcript duration ({duration}) must be non-negative"));
        }
        errors.extend(
            doc.segments
                .iter()
                .enumerate()
                .filter_map(|(i, s)| Self::check_span("segment", i, s.start, s.end, duration)),
        );
        errors.extend(
            doc.words
                .iter()
                .enumerate()
                .filter_map(|(i, w)| Self::check_span("word", i, w.start, w.end, duration)),
        );
        errors
    }
}

pub struct SegmentOrder;

impl ValidationRule for SegmentOrder {
    fn name(&self) -> &str {
        "segment_order"
    }

    fn check(&self, doc: &Document) -> Vec<String> {
        doc.segments
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[1].start + TIME_EPSILON < pair[0].start)
            .map(|(i, pair)| {
                format!(
                    "segment {} starts at {}, before segment {i} at {}",
                    i + 1,
                    pair[1].start,
                    pair[0].start
                )
            })
            .collect()
    }
}

pub struct SpeakerReferences;

impl ValidationRule for SpeakerReferences {
    fn name(&self) -> &str {
        "speaker_references"
    }

    fn check(&self, doc: &Document) -> Vec<String> {
        let known: HashSet<&SpeakerId> = doc.speakers.iter().map(|s| &s.id).collect();
        let mut errors = Vec::new();
        for (i, s) in doc.segments.iter().enumerate() {
            if let Some(id) = s.speaker.as_ref().filter(|id| !known.contains(id)) {
                errors.push(format!("segment {i} references unknown speaker {id}"));
            }
        }
        for (i, w) in doc.words.iter().enumerate() {
            if let Some(id) = w.speaker.as_ref().filter(|id| !known.contains(id)) {
                errors.push(format!("word {i} references unknown speaker {id}"));
            }
        }
        errors
    }
}

/// Every word lies within some segment, when both are present.
pub struct WordSegmentConsistency;

impl ValidationRule for WordSegmentConsistency {
    fn name(&self) -> &str {
        "word_segment_consistency"
    }

    fn check(&self, doc: &Document) -> Vec<String> {
        if doc.segments.is_empty() || doc.words.is_empty() {
            return Vec::new();
        }
        doc.words
            .iter()
            .enumerate()
            .filter(|(_, w)| !doc.segments.iter().any(|s| s.contains(w)))
            .map(|(i, w)| {
                format!(
                    "word {i} ({:?}, {}-{}) is not contained in any segment",
                    w.text, w.start, w.end
                )
            })
            .collect()
    }
}

pub struct LanguageTag;

impl ValidationRule for LanguageTag {
    fn name(&self) -> &str {
        "language_tag"
    }

    fn check(&self, doc: &Document) -> Vec<String> {
        if is_valid_bcp47(&doc.transcript.language) {
            Vec::new()
        } else {
            vec![format!(
                "language {:?} is not a valid BCP-47 tag",
                doc.transcript.language
            )]
        }
    }
}
