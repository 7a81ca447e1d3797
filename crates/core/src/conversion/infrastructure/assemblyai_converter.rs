use std::collections::BTreeSet;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::conversion::domain::conversion_error::ConversionError;
use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::extension_stash::{ExtensionReader, ExtensionWriter};
use crate::conversion::domain::field_reader::FieldReader;
use crate::model::{Audio, Document, Metadata, Segment, Speaker, SpeakerId, Transcript, Word};
use crate::normalization::{seconds_to_ms, ConfidenceScale};
use crate::shared::constants::{ASSEMBLYAI, ASSEMBLYAI_DEFAULT_MODEL};

const COMPLETED: &str = "completed";

/// Whole milliseconds are written as JSON integers, the way the API emits them.
fn serialize_ms<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(ms) if ms.fract() == 0.0 && ms.abs() < i64::MAX as f64 => {
            serializer.serialize_i64(*ms as i64)
        }
        Some(ms) => serializer.serialize_f64(*ms),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct AssemblyAiTranscript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<Vec<AssemblyAiWord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utterances: Option<Vec<AssemblyAiWord>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Words and utterances share a shape: text, ms timing, confidence, lettered speaker.
#[derive(Debug, Deserialize, Serialize)]
struct AssemblyAiWord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "serialize_ms")]
    start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "serialize_ms")]
    end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

struct TimedText {
    text: String,
    start: f64,
    end: f64,
    confidence: f64,
    speaker: Option<String>,
}

/// AssemblyAI transcript object. Timestamps are milliseconds; speakers are letters.
///
/// Only `completed` transcripts convert.
pub struct AssemblyAiConverter;

impl AssemblyAiConverter {
    fn read_timed(
        reader: &FieldReader,
        raw: AssemblyAiWord,
        path: &str,
    ) -> Result<(TimedText, Map<String, Value>), ConversionError> {
        let timed = TimedText {
            start: reader.required_milliseconds(raw.start, format!("{path}.start"))?,
            end: reader.required_milliseconds(raw.end, format!("{path}.end"))?,
            confidence: reader.confidence(
                raw.confidence,
                ConfidenceScale::UnitInterval,
                &format!("{path}.confidence"),
            ),
            text: raw.text.unwrap_or_default(),
            speaker: raw.speaker,
        };
        Ok((timed, raw.extra))
    }

    fn write_timed(
        text: &str,
        start: f64,
        end: f64,
        confidence: f64,
        speaker: Option<&SpeakerId>,
        extra: Map<String, Value>,
        path: &str,
    ) -> Result<AssemblyAiWord, ConversionError> {
        let ms = |seconds: f64, field: &str| {
            seconds_to_ms(seconds)
                .map(|v| v as f64)
                .map_err(|e| ConversionError::InvalidField {
                    provider: ASSEMBLYAI.to_string(),
                    path: format!("{path}.{field}"),
                    reason: e.to_string(),
                })
        };
        Ok(AssemblyAiWord {
            text: Some(text.to_string()),
            start: Some(ms(start, "start")?),
            end: Some(ms(end, "end")?),
            confidence: Some(confidence),
            speaker: speaker.map(ToString::to_string),
            extra,
        })
    }
}

impl Converter for AssemblyAiConverter {
    fn provider_name(&self) -> &'static str {
        ASSEMBLYAI
    }

    fn convert_to_canonical(&self, data: &Value) -> Result<Document, ConversionError> {
        let reader = FieldReader::new(ASSEMBLYAI);
        let response: AssemblyAiTranscript = reader.decode(data)?;

        let status = reader.required(response.status, "status")?;
        if status != COMPLETED {
            return Err(reader.invalid("status", format!("transcript is `{status}`, not `{COMPLETED}`")));
        }
        let text = reader.required(response.text, "text")?;
        let duration = reader.required_seconds(response.audio_duration, "audio_duration")?;
        let confidence =
            reader.confidence(response.confidence, ConfidenceScale::UnitInterval, "confidence");
        let language = reader.language(response.language_code.as_deref());

        let mut speaker_ids = BTreeSet::new();
        let mut words = Vec::new();
        let mut word_extras = Vec::new();
        for (i, raw) in response.words.unwrap_or_default().into_iter().enumerate() {
            let (t, extra) = Self::read_timed(&reader, raw, &format!("words[{i}]"))?;
            let mut word = Word::new(t.text, t.start, t.end, t.confidence);
            if let Some(s) = t.speaker {
                speaker_ids.insert(s.clone());
                word = word.with_speaker(s.as_str());
            }
            words.push(word);
            word_extras.push(extra);
        }

        let mut segments = Vec::new();
        let mut utterance_extras = Vec::new();
        let has_utterances = response.utterances.is_some();
        for (i, raw) in response.utterances.unwrap_or_default().into_iter().enumerate() {
            let (t, extra) = Self::read_timed(&reader, raw, &format!("utterances[{i}]"))?;
            let mut segment = Segment::new(t.start, t.end, t.text, t.confidence);
            if let Some(s) = t.speaker {
                speaker_ids.insert(s.clone());
                segment = segment.with_speaker(s.as_str());
            }
            segments.push(segment);
            utterance_extras.push(extra);
        }
        if !has_utterances {
            if let (Some(first), Some(last)) = (words.first(), words.last()) {
                segments.push(Segment::new(first.start, last.end, text.clone(), confidence));
            }
        }

        let speakers = speaker_ids
            .into_iter()
            .map(|s| Speaker::new(s.as_str()).with_label(format!("Speaker {s}")))
            .collect();
        let model = response
            .extra
            .get("speech_model")
            .and_then(Value::as_str)
            .unwrap_or(ASSEMBLYAI_DEFAULT_MODEL)
            .to_string();

        let mut stash = ExtensionWriter::new(ASSEMBLYAI);
        stash.object("response", response.extra);
        stash.list("words", word_extras);
        stash.list("utterances", utterance_extras);
        if has_utterances {
            stash.value("has_utterances", Value::Bool(true));
        }

        let doc = Document::new(Transcript::new(text, language, duration, confidence))
            .with_segments(segments)
            .with_words(words)
            .with_speakers(speakers)
            .with_audio(Audio::new(duration))
            .with_metadata(Metadata::new(ASSEMBLYAI, model))
            .with_extensions(stash.finish())
            .with_computed_quality();
        log::debug!(
            "assemblyai: converted {} segments, {} words",
            doc.segments.len(),
            doc.words.len()
        );
        Ok(doc)
    }

    fn convert_from_canonical(&self, doc: &Document) -> Result<Value, ConversionError> {
        let stash = ExtensionReader::new(doc, ASSEMBLYAI);

        let words = doc
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Self::write_timed(
                    &w.text,
                    w.start,
                    w.end,
                    w.confidence,
                    w.speaker.as_ref(),
                    stash.list_item("words", i),
                    &format!("words[{i}]"),
                )
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;

        // Documents read from AssemblyAI record whether utterances were present; others
        // write them whenever a segment carries a speaker.
        let write_utterances = if doc.extension(ASSEMBLYAI).is_some() {
            stash.has("has_utterances")
        } else {
            doc.segments.iter().any(|s| s.speaker.is_some())
        };
        let utterances = if write_utterances {
            let list = doc
                .segments
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    Self::write_timed(
                        &s.text,
                        s.start,
                        s.end,
                        s.confidence,
                        s.speaker.as_ref(),
                        stash.list_item("utterances", i),
                        &format!("utterances[{i}]"),
                    )
                })
                .collect::<Result<Vec<_>, ConversionError>>()?;
            Some(list)
        } else {
            None
        };

        let mut extra = stash.object("response");
        if let Some(model) = doc.metadata.as_ref().map(|m| m.model.clone()) {
            if extra.contains_key("speech_model") || model != ASSEMBLYAI_DEFAULT_MODEL {
                extra.insert("speech_model".to_string(), Value::String(model));
            }
        }

        let transcript = AssemblyAiTranscript {
            status: Some(COMPLETED.to_string()),
            text: Some(doc.transcript.text.clone()),
            audio_duration: Some(doc.transcript.duration),
            confidence: Some(doc.transcript.confidence),
            language_code: Some(doc.transcript.language.clone()),
            words: Some(words),
            utterances,
            extra,
        };
        serde_json::to_value(transcript).map_err(|e| ConversionError::InvalidShape {
            provider: ASSEMBLYAI.to_string(),
            reason: e.to_string(),
        })
    }
}
