use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::provider_failure::ProviderFailure;
use super::samples::ProviderSamples;
use crate::conversion::domain::provider_error::ProviderError;
use crate::conversion::infrastructure::converter_registry::ConverterRegistry;
use crate::model::Document;
use crate::validation::validate_wtf_document;

/// What one provider produced, plus whether it passed the built-in rules.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub provider: String,
    pub is_valid: bool,
    pub validation_errors: Vec<String>,
    pub confidence: f64,
    pub word_count: usize,
    pub segment_count: usize,
    pub duration: f64,
}

impl ProviderSummary {
    fn of(provider: &str, doc: &Document) -> Self {
        let (is_valid, validation_errors) = validate_wtf_document(doc);
        Self {
            provider: provider.to_string(),
            is_valid,
            validation_errors,
            confidence: doc.transcript.confidence,
            word_count: doc.words.len(),
            segment_count: doc.segments.len(),
            duration: doc.transcript.duration,
        }
    }
}

/// Unordered pair of provider names; `new("b", "a") == new("a", "b")`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderPair {
    first: String,
    second: String,
}

impl ProviderPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

impl fmt::Display for ProviderPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.first, self.second)
    }
}

impl Serialize for ProviderPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Structured differences between two providers' documents. No verdict is drawn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairwiseDiff {
    pub transcript_text_match: bool,
    pub duration_diff: f64,
    pub confidence_diff: f64,
    pub num_segments_diff: usize,
}

impl PairwiseDiff {
    pub fn between(a: &Document, b: &Document) -> Self {
        Self {
            transcript_text_match: a.transcript.text.trim() == b.transcript.text.trim(),
            duration_diff: (a.transcript.duration - b.transcript.duration).abs(),
            confidence_diff: (a.transcript.confidence - b.transcript.confidence).abs(),
            num_segments_diff: a.segments.len().abs_diff(b.segments.len()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsistencyReport {
    summaries: Vec<ProviderSummary>,
    pairs: BTreeMap<ProviderPair, PairwiseDiff>,
    failures: Vec<ProviderFailure>,
}

impl ConsistencyReport {
    /// Per-provider summaries in request order, converted providers only.
    pub fn summaries(&self) -> &[ProviderSummary] {
        &self.summaries
    }

    pub fn pairs(&self) -> &BTreeMap<ProviderPair, PairwiseDiff> {
        &self.pairs
    }

    pub fn pair(&self, a: &str, b: &str) -> Option<&PairwiseDiff> {
        self.pairs.get(&ProviderPair::new(a, b))
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }

    pub fn valid_count(&self) -> usize {
        self.summaries.iter().filter(|s| s.is_valid).count()
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CROSS-PROVIDER CONSISTENCY")?;
        writeln!(
            f,
            "valid providers: {}/{}",
            self.valid_count(),
            self.summaries.len() + self.failures.len()
        )?;
        writeln!(f)?;
        for s in &self.summaries {
            writeln!(
                f,
                "{}: {} confidence={:.3} words={} segments={} duration={:.2}s",
                s.provider,
                if s.is_valid { "valid" } else { "INVALID" },
                s.confidence,
                s.word_count,
                s.segment_count,
                s.duration
            )?;
            for e in &s.validation_errors {
                writeln!(f, "  - {e}")?;
            }
        }
        for failure in &self.failures {
            writeln!(f, "{failure}")?;
        }
        if !self.pairs.is_empty() {
            writeln!(f)?;
        }
        for (pair, diff) in &self.pairs {
            writeln!(
                f,
                "{pair}: text_match={} duration_diff={:.3}s confidence_diff={:.3} segments_diff={}",
                diff.transcript_text_match, diff.duration_diff, diff.confidence_diff, diff.num_segments_diff
            )?;
        }
        Ok(())
    }
}

/// Converts the same audio through several providers and diffs every pair of results.
pub struct ConsistencyAnalyzer<'r> {
    registry: &'r ConverterRegistry,
}

impl<'r> ConsistencyAnalyzer<'r> {
    pub fn new(registry: &'r ConverterRegistry) -> Self {
        Self { registry }
    }

    pub fn analyze(&self, samples: &ProviderSamples) -> Result<ConsistencyReport, ProviderError> {
        let inputs = samples.resolve(self.registry)?;

        let mut converted: Vec<(&str, Document)> = Vec::new();
        let mut failures = Vec::new();
        for (converter, sample) in inputs {
            let name = converter.provider_name();
            match converter.convert_to_canonical(sample) {
                Ok(doc) => converted.push((name, doc)),
                Err(e) => failures.push(ProviderFailure::new(name, e)),
            }
        }

        let summaries: Vec<ProviderSummary> = converted
            .iter()
            .map(|(name, doc)| ProviderSummary::of(name, doc))
            .collect();

        let mut pairs = BTreeMap::new();
        for (i, (a, doc_a)) in converted.iter().enumerate() {
            for (b, doc_b) in &converted[i + 1..] {
                pairs.insert(ProviderPair::new(*a, *b), PairwiseDiff::between(doc_a, doc_b));
            }
        }

        let report = ConsistencyReport {
            summaries,
            pairs,
            failures,
        };
        log::info!(
            "consistency: {} provider(s) converted, {} valid, {} failed, {} pair(s)",
            report.summaries.len(),
            report.valid_count(),
            report.failures.len(),
            report.pairs.len()
        );
        Ok(report)
    }
}

impl Default for ConsistencyAnalyzer<'static> {
    fn default() -> Self {
        Self::new(ConverterRegistry::global())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::infrastructure::fixtures;
    use crate::model::{Segment, Transcript};
    use approx::assert_relative_eq;

    #[test]
    fn test_same_text_from_two_providers_matches() {
        let samples = ProviderSamples::per_provider([
            ("whisper", fixtures::whisper_sample()),
            ("deepgram", fixtures::deepgram_sample()),
        ]);
        let report = ConsistencyAnalyzer::default().analyze(&samples).unwrap();
        let diff = report.pair("deepgram", "whisper").unwrap();
        assert!(diff.transcript_text_match);
        assert_eq!(diff.num_segments_diff, 0);
        assert_relative_eq!(diff.duration_diff, 0.0);
        assert!(report.failures().is_empty());
    }

    #[test]
    fn test_pairs_cover_every_unordered_combination() {
        let samples = ProviderSamples::per_provider([
            ("whisper", fixtures::whisper_sample()),
            ("deepgram", fixtures::deepgram_sample()),
            ("assemblyai", fixtures::assemblyai_sample()),
        ]);
        let report = ConsistencyAnalyzer::default().analyze(&samples).unwrap();
        assert_eq!(report.pairs().len(), 3);
        assert!(report.pair("assemblyai", "whisper").is_some());
        assert_eq!(report.valid_count(), 3);
    }

    #[test]
    fn test_shared_sample_records_failures_and_continues() {
        let samples = ProviderSamples::shared(fixtures::whisper_sample(), ["whisper", "deepgram"]);
        let report = ConsistencyAnalyzer::default().analyze(&samples).unwrap();
        assert_eq!(report.summaries().len(), 1);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].provider, "deepgram");
        assert!(report.pairs().is_empty());
    }

    #[test]
    fn test_unknown_provider_fails_up_front() {
        let samples = ProviderSamples::shared(fixtures::whisper_sample(), ["whisper", "otter"]);
        assert!(ConsistencyAnalyzer::default().analyze(&samples).is_err());
    }

    #[test]
    fn test_provider_listed_twice_fails_up_front() {
        let mut other = fixtures::whisper_sample();
        other["text"] = serde_json::json!("Something else entirely.");
        let samples = ProviderSamples::per_provider([
            ("whisper", fixtures::whisper_sample()),
            ("Whisper", other),
            ("deepgram", fixtures::deepgram_sample()),
        ]);
        let err = ConsistencyAnalyzer::default().analyze(&samples).unwrap_err();
        assert_eq!(
            err,
            ProviderError::DuplicateProvider {
                name: "whisper".into()
            }
        );
    }

    #[test]
    fn test_diff_is_absolute() {
        let a = Document::new(Transcript::new(" same ", "en-US", 2.0, 0.9))
            .with_segments(vec![Segment::new(0.0, 1.0, "same", 0.9)]);
        let b = Document::new(Transcript::new("same", "en-US", 3.5, 0.6));
        let diff = PairwiseDiff::between(&b, &a);
        assert!(diff.transcript_text_match);
        assert_relative_eq!(diff.duration_diff, 1.5);
        assert_relative_eq!(diff.confidence_diff, 0.3, epsilon = 1e-12);
        assert_eq!(diff.num_segments_diff, 1);
    }

    #[test]
    fn test_report_serializes_pairs_by_name() {
        let samples = ProviderSamples::shared(fixtures::nemo_sample(), ["parakeet", "canary"]);
        let report = ConsistencyAnalyzer::default().analyze(&samples).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["pairs"]["canary vs parakeet"]["transcript_text_match"], true);
        assert!(report.to_string().contains("canary vs parakeet"));
    }
}
