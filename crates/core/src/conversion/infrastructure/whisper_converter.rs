use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::conversion::domain::conversion_error::ConversionError;
use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::extension_stash::{ExtensionReader, ExtensionWriter};
use crate::conversion::domain::field_reader::FieldReader;
use crate::model::{Audio, Document, Metadata, Segment, Transcript, Word};
use crate::normalization::{normalize_confidence, ConfidenceScale};
use crate::shared::constants::{
    DEFAULT_CONFIDENCE, MIN_LOG_CONFIDENCE, WHISPER, WHISPER_DEFAULT_MODEL,
};
use crate::shared::math::mean;

const AVG_LOGPROB: &str = "avg_logprob";

#[derive(Debug, Deserialize, Serialize)]
struct WhisperResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<WhisperSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<Vec<WhisperWord>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct WhisperSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avg_logprob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<Vec<WhisperWord>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct WhisperWord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    probability: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// OpenAI Whisper `verbose_json` output.
///
/// Segment confidence comes from `avg_logprob` (a natural-log probability); word confidence
/// from `probability`. Words may be nested under segments or listed at the top level.
pub struct WhisperConverter;

impl WhisperConverter {
    fn read_word(
        reader: &FieldReader,
        raw: WhisperWord,
        path: &str,
    ) -> Result<(Word, Map<String, Value>), ConversionError> {
        let start = reader.required_seconds(raw.start, format!("{path}.start"))?;
        let end = reader.required_seconds(raw.end, format!("{path}.end"))?;
        let confidence = reader.confidence(
            raw.probability,
            ConfidenceScale::UnitInterval,
            &format!("{path}.probability"),
        );
        let word = Word::new(raw.word.unwrap_or_default(), start, end, confidence);
        Ok((word, raw.extra))
    }

    fn write_word(word: &Word, extra: Map<String, Value>) -> WhisperWord {
        WhisperWord {
            word: Some(word.text.clone()),
            start: Some(word.start),
            end: Some(word.end),
            probability: Some(word.confidence),
            extra,
        }
    }

    /// Log probability to write for a segment: the stashed raw value when it still produces
    /// the segment's confidence, otherwise the log of the confidence.
    fn avg_logprob_for(segment: &Segment, raw: Option<f64>) -> Option<f64> {
        match raw {
            Some(lp) if normalize_confidence(lp, ConfidenceScale::LogProbability) == segment.confidence => {
                Some(lp)
            }
            None if segment.confidence == DEFAULT_CONFIDENCE => None,
            _ => Some(segment.confidence.max(MIN_LOG_CONFIDENCE).ln()),
        }
    }
}

impl Converter for WhisperConverter {
    fn provider_name(&self) -> &'static str {
        WHISPER
    }

    fn convert_to_canonical(&self, data: &Value) -> Result<Document, ConversionError> {
        let reader = FieldReader::new(WHISPER);
        let response: WhisperResponse = reader.decode(data)?;

        let text = reader.required(response.text, "text")?;
        let duration = reader.required_seconds(response.duration, "duration")?;
        let language = reader.language(response.language.as_deref());

        let mut segments = Vec::new();
        let mut segment_extras = Vec::new();
        let mut words = Vec::new();
        let mut word_extras = Vec::new();
        let mut placement = Vec::new();
        let mut logprobs = Vec::new();

        for (i, raw) in response.segments.unwrap_or_default().into_iter().enumerate() {
            let path = format!("segments[{i}]");
            let start = reader.required_seconds(raw.start, format!("{path}.start"))?;
            let end = reader.required_seconds(raw.end, format!("{path}.end"))?;
            let confidence = reader.confidence(
                raw.avg_logprob,
                ConfidenceScale::LogProbability,
                &format!("{path}.avg_logprob"),
            );

            for (j, raw_word) in raw.words.unwrap_or_default().into_iter().enumerate() {
                let (word, extra) = Self::read_word(&reader, raw_word, &format!("{path}.words[{j}]"))?;
                words.push(word);
                word_extras.push(extra);
                placement.push(Some(i));
            }

            let mut extra = raw.extra;
            if let Some(lp) = raw.avg_logprob {
                logprobs.push(lp);
                extra.insert(AVG_LOGPROB.to_string(), json!(lp));
            }
            segment_extras.push(extra);
            segments.push(Segment::new(start, end, raw.text.unwrap_or_default(), confidence));
        }

        for (j, raw_word) in response.words.unwrap_or_default().into_iter().enumerate() {
            let (word, extra) = Self::read_word(&reader, raw_word, &format!("words[{j}]"))?;
            words.push(word);
            word_extras.push(extra);
            placement.push(None);
        }

        let confidence = if segments.is_empty() {
            0.0
        } else {
            mean(&logprobs)
                .map(|lp| normalize_confidence(lp, ConfidenceScale::LogProbability))
                .unwrap_or(DEFAULT_CONFIDENCE)
        };
        let model = response
            .extra
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(WHISPER_DEFAULT_MODEL)
            .to_string();

        let doc = Document::new(Transcript::new(text, language, duration, confidence))
            .with_segments(segments)
            .with_words(words)
            .with_audio(Audio::new(duration))
            .with_metadata(Metadata::new(WHISPER, model));

        let mut stash = ExtensionWriter::new(WHISPER);
        stash.object("response", response.extra);
        stash.list("segments", segment_extras);
        stash.list("words", word_extras);
        stash.placement(&doc, &placement);

        log::debug!(
            "whisper: converted {} segments, {} words",
            doc.segments.len(),
            doc.words.len()
        );
        Ok(doc.with_extensions(stash.finish()).with_computed_quality())
    }

    fn convert_from_canonical(&self, doc: &Document) -> Result<Value, ConversionError> {
        let stash = ExtensionReader::new(doc, WHISPER);
        let placement = stash.placement(doc);

        let mut nested: Vec<Vec<WhisperWord>> = doc.segments.iter().map(|_| Vec::new()).collect();
        let mut top_level = Vec::new();
        for (i, word) in doc.words.iter().enumerate() {
            let out = Self::write_word(word, stash.list_item("words", i));
            match placement.get(i).copied().flatten() {
                Some(s) => nested[s].push(out),
                None => top_level.push(out),
            }
        }

        let segments = doc
            .segments
            .iter()
            .zip(nested)
            .enumerate()
            .map(|(i, (segment, words))| {
                let mut extra = stash.list_item("segments", i);
                let raw = extra.remove(AVG_LOGPROB).and_then(|v| v.as_f64());
                WhisperSegment {
                    start: Some(segment.start),
                    end: Some(segment.end),
                    text: Some(segment.text.clone()),
                    avg_logprob: Self::avg_logprob_for(segment, raw),
                    words: (!words.is_empty()).then_some(words),
                    extra,
                }
            })
            .collect();

        let response = WhisperResponse {
            text: Some(doc.transcript.text.clone()),
            language: Some(doc.transcript.language.clone()),
            duration: Some(doc.transcript.duration),
            segments: Some(segments),
            words: (!top_level.is_empty()).then_some(top_level),
            extra: stash.object("response"),
        };
        serde_json::to_value(response).map_err(|e| ConversionError::InvalidShape {
            provider: WHISPER.to_string(),
            reason: e.to_string(),
        })
    }
}
