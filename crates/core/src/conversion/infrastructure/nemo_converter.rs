use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::conversion::domain::conversion_error::ConversionError;
use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::extension_stash::{ExtensionReader, ExtensionWriter};
use crate::conversion::domain::field_reader::FieldReader;
use crate::model::{Audio, Document, Metadata, Segment, Transcript, Word};
use crate::normalization::ConfidenceScale;
use crate::shared::constants::{CANARY, CANARY_DEFAULT_MODEL, PARAKEET, PARAKEET_DEFAULT_MODEL};
use crate::shared::math::mean;

#[derive(Debug, Deserialize, Serialize)]
struct NemoOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<NemoSpan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<Vec<NemoSpan>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Segments and words share one shape; ids and word-id lists stay in `extra`.
#[derive(Debug, Deserialize, Serialize)]
struct NemoSpan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

struct ReadSpan {
    start: f64,
    end: f64,
    text: String,
    confidence: f64,
}

/// Output of the NVIDIA NeMo local models (Canary, Parakeet): flat segment and word lists
/// with unit-interval confidences and a sample rate. No diarization.
pub struct NemoConverter {
    provider: &'static str,
    default_model: &'static str,
}

impl NemoConverter {
    pub fn canary() -> Self {
        Self {
            provider: CANARY,
            default_model: CANARY_DEFAULT_MODEL,
        }
    }

    pub fn parakeet() -> Self {
        Self {
            provider: PARAKEET,
            default_model: PARAKEET_DEFAULT_MODEL,
        }
    }

    fn read_spans(
        reader: &FieldReader,
        spans: Option<Vec<NemoSpan>>,
        key: &str,
    ) -> Result<(Vec<ReadSpan>, Vec<Map<String, Value>>), ConversionError> {
        let mut read = Vec::new();
        let mut extras = Vec::new();
        for (i, raw) in spans.unwrap_or_default().into_iter().enumerate() {
            let path = format!("{key}[{i}]");
            read.push(ReadSpan {
                start: reader.required_seconds(raw.start, format!("{path}.start"))?,
                end: reader.required_seconds(raw.end, format!("{path}.end"))?,
                text: raw.text.unwrap_or_default(),
                confidence: reader.confidence(
                    raw.confidence,
                    ConfidenceScale::UnitInterval,
                    &format!("{path}.confidence"),
                ),
            });
            extras.push(raw.extra);
        }
        Ok((read, extras))
    }

    fn write_span(
        start: f64,
        end: f64,
        text: &str,
        confidence: f64,
        extra: Map<String, Value>,
    ) -> NemoSpan {
        NemoSpan {
            start: Some(start),
            end: Some(end),
            text: Some(text.to_string()),
            confidence: Some(confidence),
            extra,
        }
    }
}

impl Converter for NemoConverter {
    fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn convert_to_canonical(&self, data: &Value) -> Result<Document, ConversionError> {
        let reader = FieldReader::new(self.provider);
        let output: NemoOutput = reader.decode(data)?;

        let text = reader.required(output.text, "text")?;
        let duration = reader.required_seconds(output.duration, "duration")?;
        let language = reader.language(output.language.as_deref());

        let (segments, segment_extras) = Self::read_spans(&reader, output.segments, "segments")?;
        let (words, word_extras) = Self::read_spans(&reader, output.words, "words")?;
        let segments: Vec<Segment> = segments
            .into_iter()
            .map(|s| Segment::new(s.start, s.end, s.text, s.confidence))
            .collect();
        let words: Vec<Word> = words
            .into_iter()
            .map(|w| Word::new(w.text, w.start, w.end, w.confidence))
            .collect();

        let word_confidences: Vec<f64> = words.iter().map(|w| w.confidence).collect();
        let confidence = mean(&word_confidences).unwrap_or_default();

        let mut audio = Audio::new(duration);
        if let Some(rate) = output.sample_rate {
            audio = audio.with_sample_rate(rate);
        }
        let model = output.model.unwrap_or_else(|| self.default_model.to_string());

        let mut stash = ExtensionWriter::new(self.provider);
        stash.object("response", output.extra);
        stash.list("segments", segment_extras);
        stash.list("words", word_extras);

        let doc = Document::new(Transcript::new(text, language, duration, confidence))
            .with_segments(segments)
            .with_words(words)
            .with_audio(audio)
            .with_metadata(Metadata::new(self.provider, model))
            .with_extensions(stash.finish())
            .with_computed_quality();
        log::debug!(
            "{}: converted {} segments, {} words",
            self.provider,
            doc.segments.len(),
            doc.words.len()
        );
        Ok(doc)
    }

    fn convert_from_canonical(&self, doc: &Document) -> Result<Value, ConversionError> {
        let stash = ExtensionReader::new(doc, self.provider);
        let segments = doc
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Self::write_span(s.start, s.end, &s.text, s.confidence, stash.list_item("segments", i))
            })
            .collect();
        let words = doc
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Self::write_span(w.start, w.end, &w.text, w.confidence, stash.list_item("words", i))
            })
            .collect();

        let output = NemoOutput {
            text: Some(doc.transcript.text.clone()),
            language: Some(doc.transcript.language.clone()),
            duration: Some(doc.transcript.duration),
            model: Some(
                doc.metadata
                    .as_ref()
                    .map(|m| m.model.clone())
                    .unwrap_or_else(|| self.default_model.to_string()),
            ),
            sample_rate: doc.audio.as_ref().and_then(|a| a.sample_rate),
            segments: Some(segments),
            words: Some(words),
            extra: stash.object("response"),
        };
        serde_json::to_value(output).map_err(|e| ConversionError::InvalidShape {
            provider: self.provider.to_string(),
            reason: e.to_string(),
        })
    }
}
