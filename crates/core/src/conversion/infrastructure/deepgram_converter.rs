use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::conversion::domain::conversion_error::ConversionError;
use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::extension_stash::{ExtensionReader, ExtensionWriter};
use crate::conversion::domain::field_reader::FieldReader;
use crate::model::{Audio, Document, Metadata, Segment, Speaker, SpeakerId, Transcript, Word};
use crate::normalization::ConfidenceScale;
use crate::shared::constants::{DEEPGRAM, DEEPGRAM_DEFAULT_MODEL};

#[derive(Debug, Deserialize, Serialize)]
struct DeepgramResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<DeepgramMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<DeepgramResults>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DeepgramMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channels: Option<u16>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DeepgramResults {
    // Only the first channel is typed; the rest are kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channels: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utterances: Option<Vec<DeepgramUtterance>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DeepgramChannel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alternatives: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detected_language: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DeepgramAlternative {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<Vec<DeepgramWord>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DeepgramWord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DeepgramUtterance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Deepgram prerecorded response (`metadata` + `results.channels[].alternatives[]`).
///
/// The first alternative of the first channel is canonical; other channels and
/// alternatives are preserved verbatim. Utterances become segments; without them a single
/// segment spans the words.
pub struct DeepgramConverter;

impl DeepgramConverter {
    fn model_name(metadata: &Map<String, Value>) -> String {
        metadata
            .get("model_info")
            .and_then(Value::as_object)
            .and_then(|info| info.values().next())
            .and_then(|model| model.get("name").or_else(|| model.get("arch")))
            .and_then(Value::as_str)
            .unwrap_or(DEEPGRAM_DEFAULT_MODEL)
            .to_string()
    }

    fn parse_created(reader: &FieldReader, raw: &str) -> Result<DateTime<Utc>, ConversionError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| reader.invalid("metadata.created", e.to_string()))
    }

    fn speaker_int(speaker: Option<&SpeakerId>, path: &str) -> Result<Option<i64>, ConversionError> {
        match speaker {
            None => Ok(None),
            Some(id) => id.as_int().map(Some).ok_or_else(|| ConversionError::MissingInformation {
                provider: DEEPGRAM.to_string(),
                reason: format!("{path} speaker `{id}` is not an integer"),
            }),
        }
    }

    fn to_value<T: Serialize>(value: T) -> Result<Value, ConversionError> {
        serde_json::to_value(value).map_err(|e| ConversionError::InvalidShape {
            provider: DEEPGRAM.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Converter for DeepgramConverter {
    fn provider_name(&self) -> &'static str {
        DEEPGRAM
    }

    fn convert_to_canonical(&self, data: &Value) -> Result<Document, ConversionError> {
        let reader = FieldReader::new(DEEPGRAM);
        let response: DeepgramResponse = reader.decode(data)?;

        let metadata = reader.required(response.metadata, "metadata")?;
        let duration = reader.required_seconds(metadata.duration, "metadata.duration")?;
        let results = reader.required(response.results, "results")?;

        let mut channels = results.channels.unwrap_or_default().into_iter();
        let first_channel = reader.required(channels.next(), "results.channels[0]")?;
        let channel: DeepgramChannel = reader.decode(&first_channel)?;
        let mut alternatives = channel.alternatives.unwrap_or_default().into_iter();
        let first_alternative = reader.required(
            alternatives.next(),
            "results.channels[0].alternatives[0]",
        )?;
        let alternative: DeepgramAlternative = reader.decode(&first_alternative)?;

        let text = alternative.transcript.unwrap_or_default();
        let confidence = reader.confidence(
            alternative.confidence,
            ConfidenceScale::UnitInterval,
            "results.channels[0].alternatives[0].confidence",
        );
        let language = reader.language(channel.detected_language.as_deref());

        let mut speaker_ids = BTreeSet::new();
        let mut words = Vec::new();
        let mut word_extras = Vec::new();
        for (i, raw) in alternative.words.unwrap_or_default().into_iter().enumerate() {
            let path = format!("results.channels[0].alternatives[0].words[{i}]");
            let start = reader.required_seconds(raw.start, format!("{path}.start"))?;
            let end = reader.required_seconds(raw.end, format!("{path}.end"))?;
            let c = reader.confidence(
                raw.confidence,
                ConfidenceScale::UnitInterval,
                &format!("{path}.confidence"),
            );
            let mut word = Word::new(raw.word.unwrap_or_default(), start, end, c);
            if let Some(s) = raw.speaker {
                speaker_ids.insert(s);
                word = word.with_speaker(s);
            }
            words.push(word);
            word_extras.push(raw.extra);
        }

        let mut segments = Vec::new();
        let mut utterance_extras = Vec::new();
        let has_utterances = results.utterances.is_some();
        match results.utterances {
            Some(utterances) => {
                for (i, raw) in utterances.into_iter().enumerate() {
                    let path = format!("results.utterances[{i}]");
                    let start = reader.required_seconds(raw.start, format!("{path}.start"))?;
                    let end = reader.required_seconds(raw.end, format!("{path}.end"))?;
                    let c = reader.confidence(
                        raw.confidence,
                        ConfidenceScale::UnitInterval,
                        &format!("{path}.confidence"),
                    );
                    let mut segment = Segment::new(start, end, raw.transcript.unwrap_or_default(), c);
                    if let Some(s) = raw.speaker {
                        speaker_ids.insert(s);
                        segment = segment.with_speaker(s);
                    }
                    segments.push(segment);
                    utterance_extras.push(raw.extra);
                }
            }
            None => {
                if let (Some(first), Some(last)) = (words.first(), words.last()) {
                    segments.push(Segment::new(first.start, last.end, text.clone(), confidence));
                }
            }
        }

        let speakers = speaker_ids
            .into_iter()
            .map(|s| Speaker::new(s).with_label(format!("Speaker {s}")))
            .collect();

        let mut meta = Metadata::new(DEEPGRAM, Self::model_name(&metadata.extra));
        if let Some(created) = metadata.created.as_deref() {
            meta = meta.with_created_at(Self::parse_created(&reader, created)?);
        }
        let mut audio = Audio::new(duration);
        if let Some(n) = metadata.channels {
            audio = audio.with_channels(n);
        }

        let mut stash = ExtensionWriter::new(DEEPGRAM);
        stash.object("response", response.extra);
        stash.object("metadata", metadata.extra);
        stash.object("results", results.extra);
        stash.object("channel", channel.extra);
        stash.object("alternative", alternative.extra);
        stash.list("words", word_extras);
        stash.list("utterances", utterance_extras);
        if has_utterances {
            stash.value("has_utterances", Value::Bool(true));
        }
        let other_channels: Vec<Value> = channels.collect();
        if !other_channels.is_empty() {
            stash.value("other_channels", Value::Array(other_channels));
        }
        let other_alternatives: Vec<Value> = alternatives.collect();
        if !other_alternatives.is_empty() {
            stash.value("other_alternatives", Value::Array(other_alternatives));
        }

        let doc = Document::new(Transcript::new(text, language, duration, confidence))
            .with_segments(segments)
            .with_words(words)
            .with_speakers(speakers)
            .with_audio(audio)
            .with_metadata(meta)
            .with_extensions(stash.finish())
            .with_computed_quality();
        log::debug!(
            "deepgram: converted {} segments, {} words, {} speakers",
            doc.segments.len(),
            doc.words.len(),
            doc.speakers.len()
        );
        Ok(doc)
    }

    fn convert_from_canonical(&self, doc: &Document) -> Result<Value, ConversionError> {
        if doc.words.is_empty() && !doc.transcript.text.trim().is_empty() {
            return Err(ConversionError::MissingInformation {
                provider: DEEPGRAM.to_string(),
                reason: "word timings are required for a non-empty transcript".to_string(),
            });
        }
        let stash = ExtensionReader::new(doc, DEEPGRAM);

        let words = doc
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Ok(DeepgramWord {
                    word: Some(w.text.clone()),
                    start: Some(w.start),
                    end: Some(w.end),
                    confidence: Some(w.confidence),
                    speaker: Self::speaker_int(w.speaker.as_ref(), &format!("word {i}"))?,
                    extra: stash.list_item("words", i),
                })
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;

        // A single segment spanning the words is how a response without utterances reads.
        // Documents read from Deepgram record whether utterances were present, even empty.
        let synthesized = !stash.has("has_utterances")
            && doc.segments.len() == 1
            && doc.segments[0].speaker.is_none()
            && doc.words.first().map(|w| w.start) == Some(doc.segments[0].start)
            && doc.words.last().map(|w| w.end) == Some(doc.segments[0].end)
            && doc.segments[0].text == doc.transcript.text
            && doc.segments[0].confidence == doc.transcript.confidence;
        let write_utterances = stash.has("has_utterances") || !doc.segments.is_empty();
        let utterances = if synthesized || !write_utterances {
            None
        } else {
            let list = doc
                .segments
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    Ok(DeepgramUtterance {
                        start: Some(s.start),
                        end: Some(s.end),
                        confidence: Some(s.confidence),
                        transcript: Some(s.text.clone()),
                        speaker: Self::speaker_int(s.speaker.as_ref(), &format!("segment {i}"))?,
                        extra: stash.list_item("utterances", i),
                    })
                })
                .collect::<Result<Vec<_>, ConversionError>>()?;
            Some(list)
        };

        let alternative = DeepgramAlternative {
            transcript: Some(doc.transcript.text.clone()),
            confidence: Some(doc.transcript.confidence),
            words: Some(words),
            extra: stash.object("alternative"),
        };
        let mut alternatives = vec![Self::to_value(alternative)?];
        if let Some(Value::Array(rest)) = stash.value("other_alternatives") {
            alternatives.extend(rest.iter().cloned());
        }
        let channel = DeepgramChannel {
            alternatives: Some(alternatives),
            detected_language: Some(doc.transcript.language.clone()),
            extra: stash.object("channel"),
        };
        let mut channels = vec![Self::to_value(channel)?];
        if let Some(Value::Array(rest)) = stash.value("other_channels") {
            channels.extend(rest.iter().cloned());
        }

        let metadata = DeepgramMetadata {
            duration: Some(doc.transcript.duration),
            created: doc
                .metadata
                .as_ref()
                .and_then(|m| m.created_at)
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            channels: doc.audio.as_ref().and_then(|a| a.channels),
            extra: stash.object("metadata"),
        };
        let response = DeepgramResponse {
            metadata: Some(metadata),
            results: Some(DeepgramResults {
                channels: Some(channels),
                utterances,
                extra: stash.object("results"),
            }),
            extra: stash.object("response"),
        };
        Self::to_value(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::infrastructure::fixtures;
    use crate::validation::validate_wtf_document;
    use chrono::TimeZone;
    use serde_json::json;

    fn converted() -> Document {
        DeepgramConverter
            .convert_to_canonical(&fixtures::deepgram_sample())
            .unwrap()
    }

    #[test]
    fn test_maps_core_fields() {
        let doc = converted();
        assert_eq!(doc.transcript.text, "Hello world. How are you?");
        assert_eq!(doc.transcript.duration, 3.0);
        assert_eq!(doc.transcript.language, "en-US");
        assert_eq!(doc.words.len(), 5);
        let meta = doc.metadata.as_ref().unwrap();
        assert_eq!(meta.model, "general-nova-2");
        assert_eq!(
            meta.created_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_utterances_become_segments_with_speakers() {
        let doc = converted();
        assert_eq!(doc.segments.len(), 2);
        assert_eq!(doc.segments[1].speaker, Some(SpeakerId::Int(1)));
        let labels: Vec<_> = doc.speakers.iter().filter_map(|s| s.label.clone()).collect();
        assert_eq!(labels, vec!["Speaker 0", "Speaker 1"]);
        let (valid, errors) = validate_wtf_document(&doc);
        assert!(valid, "{errors:?}");
    }

    #[test]
    fn test_without_utterances_single_segment_spans_words() {
        let mut sample = fixtures::deepgram_sample();
        if let Some(results) = sample["results"].as_object_mut() {
            results.remove("utterances");
        }
        let doc = DeepgramConverter.convert_to_canonical(&sample).unwrap();
        assert_eq!(doc.segments.len(), 1);
        assert_eq!(doc.segments[0].start, 0.0);
        assert_eq!(doc.segments[0].end, 2.9);

        let raw = DeepgramConverter.convert_from_canonical(&doc).unwrap();
        assert!(raw["results"].get("utterances").is_none());
        assert_eq!(DeepgramConverter.convert_to_canonical(&raw).unwrap(), doc);
    }

    #[test]
    fn test_empty_utterances_survive_round_trip() {
        let mut sample = fixtures::deepgram_sample();
        sample["results"]["utterances"] = json!([]);
        let doc = DeepgramConverter.convert_to_canonical(&sample).unwrap();
        assert!(doc.segments.is_empty());

        let raw = DeepgramConverter.convert_from_canonical(&doc).unwrap();
        assert_eq!(raw["results"]["utterances"], json!([]));
        let back = DeepgramConverter.convert_to_canonical(&raw).unwrap();
        assert!(back.segments.is_empty());
        assert_eq!(back, doc);
    }

    #[test]
    fn test_single_spanning_utterance_is_written_back() {
        let mut sample = fixtures::deepgram_sample();
        let alternative = sample["results"]["channels"][0]["alternatives"][0].clone();
        sample["results"]["utterances"] = json!([{
            "start": 0.0,
            "end": 2.9,
            "confidence": alternative["confidence"],
            "transcript": alternative["transcript"],
        }]);
        let doc = DeepgramConverter.convert_to_canonical(&sample).unwrap();
        assert_eq!(doc.segments.len(), 1);

        let raw = DeepgramConverter.convert_from_canonical(&doc).unwrap();
        assert_eq!(raw["results"]["utterances"].as_array().map(Vec::len), Some(1));
        assert_eq!(DeepgramConverter.convert_to_canonical(&raw).unwrap(), doc);
    }

    #[test]
    fn test_missing_alternatives_names_path() {
        let sample = json!({
            "metadata": {"duration": 1.0},
            "results": {"channels": [{"alternatives": []}]}
        });
        let err = DeepgramConverter.convert_to_canonical(&sample).unwrap_err();
        assert_eq!(err.path(), Some("results.channels[0].alternatives[0]"));
    }

    #[test]
    fn test_missing_duration_names_path() {
        let mut sample = fixtures::deepgram_sample();
        if let Some(meta) = sample["metadata"].as_object_mut() {
            meta.remove("duration");
        }
        let err = DeepgramConverter.convert_to_canonical(&sample).unwrap_err();
        assert_eq!(err.path(), Some("metadata.duration"));
    }

    #[test]
    fn test_round_trip_keeps_extra_channels() {
        let doc = converted();
        let raw = DeepgramConverter.convert_from_canonical(&doc).unwrap();
        assert_eq!(raw["results"]["channels"].as_array().map(Vec::len), Some(2));
        assert_eq!(raw["metadata"]["request_id"], json!("req-123"));
        assert_eq!(raw["metadata"]["created"], json!("2024-01-15T10:30:00Z"));
        assert_eq!(DeepgramConverter.convert_to_canonical(&raw).unwrap(), doc);
    }

    #[test]
    fn test_text_without_words_cannot_be_written() {
        let doc = Document::new(Transcript::new("hello", "en-US", 1.0, 0.9));
        let err = DeepgramConverter.convert_from_canonical(&doc).unwrap_err();
        assert!(matches!(err, ConversionError::MissingInformation { .. }));
    }

    #[test]
    fn test_lettered_speaker_cannot_be_written() {
        let doc = Document::new(Transcript::new("hi", "en-US", 1.0, 0.9))
            .with_words(vec![Word::new("hi", 0.0, 0.5, 0.9).with_speaker("A")])
            .with_speakers(vec![Speaker::new("A")]);
        let err = DeepgramConverter.convert_from_canonical(&doc).unwrap_err();
        assert!(matches!(err, ConversionError::MissingInformation { .. }));
    }
}
