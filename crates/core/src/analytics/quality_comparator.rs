use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::provider_failure::ProviderFailure;
use super::samples::ProviderSamples;
use crate::conversion::domain::provider_error::ProviderError;
use crate::conversion::infrastructure::converter_registry::ConverterRegistry;
use crate::model::{Document, Quality};
use crate::shared::math::mean;

/// Attached to every quality report.
pub const SELF_REPORTED_NOTICE: &str = "Rankings reflect each provider's self-reported \
     confidence. They do not measure accuracy against a reference transcript.";

const WORD_ORDER_WEIGHT: f64 = 0.4;
const SEGMENT_ORDER_WEIGHT: f64 = 0.3;
const CONTAINMENT_WEIGHT: f64 = 0.3;

/// Structural timing sanity in `[0, 1]`: words ordered by start, segments ordered by start,
/// and every word inside some segment. Zero unless the document has both words and segments.
pub fn timing_score(doc: &Document) -> f64 {
    if doc.words.is_empty() || doc.segments.is_empty() {
        return 0.0;
    }
    let words_ordered = doc.words.windows(2).all(|w| w[0].start <= w[1].start);
    let segments_ordered = doc.segments.windows(2).all(|s| s[0].start <= s[1].start);
    let contained = doc
        .words
        .iter()
        .all(|w| doc.segments.iter().any(|s| s.contains(w)));

    [
        (words_ordered, WORD_ORDER_WEIGHT),
        (segments_ordered, SEGMENT_ORDER_WEIGHT),
        (contained, CONTAINMENT_WEIGHT),
    ]
    .iter()
    .filter(|(passed, _)| *passed)
    .map(|(_, weight)| weight)
    .sum()
}

/// Share of the distinct words in `reference` that also appear in `transcribed`, ignoring
/// case. An empty reference scores 1.0 only against an empty transcription.
pub fn text_completeness(reference: &str, transcribed: &str) -> f64 {
    let expected: HashSet<String> = reference.split_whitespace().map(str::to_lowercase).collect();
    let found: HashSet<String> = transcribed.split_whitespace().map(str::to_lowercase).collect();
    if expected.is_empty() {
        return if found.is_empty() { 1.0 } else { 0.0 };
    }
    expected.intersection(&found).count() as f64 / expected.len() as f64
}

/// The top-level `text` of a raw provider sample, empty when it has none.
fn sample_text(sample: &Value) -> &str {
    sample.get("text").and_then(Value::as_str).unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderQuality {
    pub provider: String,
    /// The transcript's overall confidence, used for ranking.
    pub confidence: f64,
    pub quality: Quality,
    pub word_count: usize,
    pub segment_count: usize,
    pub timing_score: f64,
    /// Word overlap between the sample's own `text` and the converted transcript.
    pub text_completeness: f64,
}

impl ProviderQuality {
    fn of(provider: &str, doc: &Document, sample: &Value) -> Self {
        Self {
            provider: provider.to_string(),
            confidence: doc.transcript.confidence,
            quality: Quality::compute(doc),
            word_count: doc.words.len(),
            segment_count: doc.segments.len(),
            timing_score: timing_score(doc),
            text_completeness: text_completeness(sample_text(sample), &doc.transcript.text),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualityReport {
    notice: &'static str,
    ranked: Vec<ProviderQuality>,
    failures: Vec<ProviderFailure>,
}

impl QualityReport {
    pub fn notice(&self) -> &'static str {
        self.notice
    }

    /// Providers by descending overall confidence; ties keep request order.
    pub fn ranked(&self) -> &[ProviderQuality] {
        &self.ranked
    }

    pub fn best(&self) -> Option<&ProviderQuality> {
        self.ranked.first()
    }

    /// Provider with the highest text completeness; the higher-ranked wins ties.
    pub fn most_complete(&self) -> Option<&ProviderQuality> {
        self.ranked.iter().reduce(|best, p| {
            if p.text_completeness > best.text_completeness {
                p
            } else {
                best
            }
        })
    }

    pub fn mean_text_completeness(&self) -> f64 {
        let scores: Vec<f64> = self.ranked.iter().map(|p| p.text_completeness).collect();
        mean(&scores).unwrap_or(0.0)
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "QUALITY COMPARISON")?;
        writeln!(f, "{}", self.notice)?;
        writeln!(f)?;
        for (rank, p) in self.ranked.iter().enumerate() {
            writeln!(
                f,
                "{}. {} confidence={:.3} mean={:.3} min={:.3} low={}/{} completeness={:.2} timing={:.2} text={:.2}",
                rank + 1,
                p.provider,
                p.confidence,
                p.quality.mean_confidence(),
                p.quality.min_confidence(),
                p.quality.low_confidence_count(),
                p.quality.token_count(),
                p.quality.completeness(),
                p.timing_score,
                p.text_completeness
            )?;
        }
        if !self.ranked.is_empty() {
            writeln!(f, "mean text completeness: {:.2}", self.mean_text_completeness())?;
        }
        for failure in &self.failures {
            writeln!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Ranks providers by the confidence they report for the same audio.
pub struct QualityComparator<'r> {
    registry: &'r ConverterRegistry,
}

impl<'r> QualityComparator<'r> {
    pub fn new(registry: &'r ConverterRegistry) -> Self {
        Self { registry }
    }

    pub fn compare(&self, samples: &ProviderSamples) -> Result<QualityReport, ProviderError> {
        let mut ranked = Vec::new();
        let mut failures = Vec::new();
        for (converter, sample) in samples.resolve(self.registry)? {
            let name = converter.provider_name();
            match converter.convert_to_canonical(sample) {
                Ok(doc) => ranked.push(ProviderQuality::of(name, &doc, sample)),
                Err(e) => failures.push(ProviderFailure::new(name, e)),
            }
        }
        ranked.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        if let Some(best) = ranked.first() {
            log::info!(
                "quality: {} provider(s) ranked, highest self-reported confidence {} ({:.3})",
                ranked.len(),
                best.provider,
                best.confidence
            );
        }
        Ok(QualityReport {
            notice: SELF_REPORTED_NOTICE,
            ranked,
            failures,
        })
    }
}

impl Default for QualityComparator<'static> {
    fn default() -> Self {
        Self::new(ConverterRegistry::global())
    }
}
