use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::conversion::domain::conversion_error::ConversionError;
use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::extension_stash::{ExtensionReader, ExtensionWriter};
use crate::conversion::domain::field_reader::FieldReader;
use crate::model::{Audio, Document, Metadata, Segment, Speaker, SpeakerId, Transcript, Word};
use crate::normalization::ConfidenceScale;
use crate::shared::constants::{REV_AI, REV_AI_TRANSCRIBER};
use crate::shared::math::mean;

const TEXT: &str = "text";
const PUNCT: &str = "punct";
const SINGULAR: &str = "singular_monologue";

#[derive(Debug, Deserialize, Serialize)]
struct RevAiTranscript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    monologues: Option<Vec<RevAiMonologue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    monologue: Option<RevAiMonologue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_on: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RevAiMonologue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speaker_name: Option<String>,
    #[serde(default)]
    elements: Vec<RevAiElement>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RevAiElement {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_ts: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Untimed element kept with the number of text elements that precede it.
#[derive(Debug, Deserialize)]
struct StashedElement {
    before: usize,
    element: Value,
}

/// Rev.ai transcript: speaker monologues made of `text` and `punct` elements.
///
/// Each monologue is one segment whose text concatenates every element value. Timed text
/// elements become words; punctuation is preserved in the extensions.
pub struct RevAiConverter;

impl RevAiConverter {
    fn missing_information(reason: impl Into<String>) -> ConversionError {
        ConversionError::MissingInformation {
            provider: REV_AI.to_string(),
            reason: reason.into(),
        }
    }

    fn speaker_int(speaker: Option<&SpeakerId>, index: usize) -> Result<Option<i64>, ConversionError> {
        match speaker {
            None => Ok(None),
            Some(id) => id.as_int().map(Some).ok_or_else(|| {
                Self::missing_information(format!("segment {index} speaker `{id}` is not an integer"))
            }),
        }
    }

    fn text_element(word: &Word, extra: Map<String, Value>) -> RevAiElement {
        RevAiElement {
            kind: Some(TEXT.to_string()),
            value: Some(word.text.clone()),
            ts: Some(word.start),
            end_ts: Some(word.end),
            confidence: Some(word.confidence),
            extra,
        }
    }

    fn space() -> RevAiElement {
        RevAiElement {
            kind: Some(PUNCT.to_string()),
            value: Some(" ".to_string()),
            ts: None,
            end_ts: None,
            confidence: None,
            extra: Map::new(),
        }
    }

    /// Rebuild a monologue's elements: text elements from words, with stashed punctuation
    /// re-inserted at its recorded positions, or single spaces between words when none was
    /// recorded.
    fn elements(
        words: Vec<RevAiElement>,
        punctuation: Option<Vec<StashedElement>>,
    ) -> Result<Vec<RevAiElement>, ConversionError> {
        let Some(punctuation) = punctuation else {
            let count = words.len();
            let mut out = Vec::with_capacity(count * 2);
            for (i, w) in words.into_iter().enumerate() {
                out.push(w);
                if i + 1 < count {
                    out.push(Self::space());
                }
            }
            return Ok(out);
        };

        let mut by_position: BTreeMap<usize, Vec<RevAiElement>> = BTreeMap::new();
        for stashed in punctuation {
            let element: RevAiElement = serde_json::from_value(stashed.element)
                .map_err(|e| ConversionError::MalformedDocument(e.to_string()))?;
            by_position.entry(stashed.before).or_default().push(element);
        }
        let mut out = Vec::new();
        for (i, w) in words.into_iter().enumerate() {
            if let Some(before) = by_position.remove(&i) {
                out.extend(before);
            }
            out.push(w);
        }
        out.extend(by_position.into_values().flatten());
        Ok(out)
    }
}

impl Converter for RevAiConverter {
    fn provider_name(&self) -> &'static str {
        REV_AI
    }

    fn convert_to_canonical(&self, data: &Value) -> Result<Document, ConversionError> {
        let reader = FieldReader::new(REV_AI);
        let response: RevAiTranscript = reader.decode(data)?;

        let (monologues, singular) = match (response.monologues, response.monologue) {
            (Some(list), _) => (list, false),
            (None, Some(one)) => (vec![one], true),
            (None, None) => return Err(reader.missing("monologues")),
        };
        let prefix = if singular { "monologue" } else { "monologues" };

        let mut segments = Vec::new();
        let mut words = Vec::new();
        let mut placement = Vec::new();
        let mut word_extras = Vec::new();
        let mut monologue_extras = Vec::new();
        let mut punctuation = Vec::new();
        let mut speakers: BTreeMap<i64, Option<String>> = BTreeMap::new();

        for (i, monologue) in monologues.into_iter().enumerate() {
            let path = if singular {
                prefix.to_string()
            } else {
                format!("{prefix}[{i}]")
            };
            let mut text = String::new();
            let mut segment_words = Vec::new();
            let mut stashed = Vec::new();

            for (j, element) in monologue.elements.into_iter().enumerate() {
                let value = element.value.clone().unwrap_or_default();
                text.push_str(&value);
                if element.kind.as_deref() != Some(TEXT) {
                    stashed.push(json!({"before": segment_words.len(), "element": element}));
                    continue;
                }
                let epath = format!("{path}.elements[{j}]");
                let start = reader.required_seconds(element.ts, format!("{epath}.ts"))?;
                let end = reader.required_seconds(element.end_ts, format!("{epath}.end_ts"))?;
                let confidence = reader.confidence(
                    element.confidence,
                    ConfidenceScale::UnitInterval,
                    &format!("{epath}.confidence"),
                );
                let mut word = Word::new(value, start, end, confidence);
                if let Some(s) = monologue.speaker {
                    word = word.with_speaker(s);
                }
                segment_words.push(word);
                word_extras.push(element.extra);
            }

            let (Some(first), Some(last)) = (segment_words.first(), segment_words.last()) else {
                return Err(reader.invalid(format!("{path}.elements"), "no timed text elements"));
            };
            let confidences: Vec<f64> = segment_words.iter().map(|w| w.confidence).collect();
            let mut segment = Segment::new(
                first.start,
                last.end,
                text,
                mean(&confidences).unwrap_or_default(),
            );
            if let Some(s) = monologue.speaker {
                segment = segment.with_speaker(s);
                let label = speakers.entry(s).or_insert(None);
                if label.is_none() {
                    *label = monologue.speaker_name.clone();
                }
            }

            placement.extend(std::iter::repeat(Some(i)).take(segment_words.len()));
            words.extend(segment_words);
            segments.push(segment);
            monologue_extras.push(monologue.extra);
            punctuation.push(Value::Array(stashed));
        }

        let duration = match response.duration_seconds {
            Some(d) => reader.seconds(d, "duration_seconds")?,
            None => words.iter().map(|w| w.end).fold(0.0, f64::max),
        };
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let confidences: Vec<f64> = words.iter().map(|w| w.confidence).collect();
        let confidence = mean(&confidences).unwrap_or_default();
        let language = reader.language(response.language.as_deref());

        let transcriber = response
            .extra
            .get("transcriber")
            .and_then(Value::as_str)
            .unwrap_or(REV_AI_TRANSCRIBER);
        let mut metadata = Metadata::new(REV_AI, format!("rev-ai-{transcriber}"));
        if let Some(created) = response.created_on.as_deref() {
            let created = DateTime::parse_from_rfc3339(created)
                .map_err(|e| reader.invalid("created_on", e.to_string()))?;
            metadata = metadata.with_created_at(created.with_timezone(&Utc));
        }
        let speakers = speakers
            .into_iter()
            .map(|(id, label)| match label {
                Some(label) => Speaker::new(id).with_label(label),
                None => Speaker::new(id),
            })
            .collect();

        let doc = Document::new(Transcript::new(text, language, duration, confidence))
            .with_segments(segments)
            .with_words(words)
            .with_speakers(speakers)
            .with_audio(Audio::new(duration))
            .with_metadata(metadata);

        let mut stash = ExtensionWriter::new(REV_AI);
        stash.object("response", response.extra);
        stash.list("monologues", monologue_extras);
        stash.list("words", word_extras);
        stash.placement(&doc, &placement);
        if punctuation.iter().any(|p| p.as_array().is_some_and(|a| !a.is_empty())) {
            stash.value("punctuation", Value::Array(punctuation));
        }
        if singular {
            stash.value(SINGULAR, Value::Bool(true));
        }

        log::debug!(
            "rev_ai: converted {} monologues, {} words",
            doc.segments.len(),
            doc.words.len()
        );
        Ok(doc.with_extensions(stash.finish()).with_computed_quality())
    }

    fn convert_from_canonical(&self, doc: &Document) -> Result<Value, ConversionError> {
        if doc.words.is_empty() && !doc.transcript.text.trim().is_empty() {
            return Err(Self::missing_information(
                "word timings are required for a non-empty transcript",
            ));
        }
        let stash = ExtensionReader::new(doc, REV_AI);
        let placement = stash.placement(doc);
        let punctuation: Option<Vec<Vec<StashedElement>>> = match stash.value("punctuation") {
            Some(v) => Some(
                serde_json::from_value(v.clone())
                    .map_err(|e| ConversionError::MalformedDocument(e.to_string()))?,
            ),
            None => None,
        };

        let mut grouped: Vec<Vec<RevAiElement>> = doc.segments.iter().map(|_| Vec::new()).collect();
        let mut loose = Vec::new();
        for (i, word) in doc.words.iter().enumerate() {
            let element = Self::text_element(word, stash.list_item("words", i));
            match placement.get(i).copied().flatten() {
                Some(s) => grouped[s].push(element),
                None => loose.push(element),
            }
        }

        let mut punctuation = punctuation.map(Vec::into_iter);
        let mut monologues = Vec::new();
        for (i, (segment, words)) in doc.segments.iter().zip(grouped).enumerate() {
            if words.is_empty() {
                return Err(Self::missing_information(format!(
                    "segment {i} has no words to form a monologue"
                )));
            }
            let stashed = punctuation
                .as_mut()
                .map(|iter| iter.next().unwrap_or_default());
            let speaker_name = segment
                .speaker
                .as_ref()
                .and_then(|id| doc.speaker(id))
                .and_then(|s| s.label.clone());
            monologues.push(RevAiMonologue {
                speaker: Self::speaker_int(segment.speaker.as_ref(), i)?,
                speaker_name,
                elements: Self::elements(words, stashed)?,
                extra: stash.list_item("monologues", i),
            });
        }
        if !loose.is_empty() {
            monologues.push(RevAiMonologue {
                speaker: None,
                speaker_name: None,
                elements: Self::elements(loose, None)?,
                extra: Map::new(),
            });
        }

        let singular = stash.has(SINGULAR) && monologues.len() == 1;
        let (monologues, monologue) = if singular {
            (None, monologues.pop())
        } else {
            (Some(monologues), None)
        };
        let transcript = RevAiTranscript {
            monologues,
            monologue,
            language: Some(doc.transcript.language.clone()),
            duration_seconds: Some(doc.transcript.duration),
            created_on: doc
                .metadata
                .as_ref()
                .and_then(|m| m.created_at)
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            extra: stash.object("response"),
        };
        serde_json::to_value(transcript).map_err(|e| ConversionError::InvalidShape {
            provider: REV_AI.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::infrastructure::fixtures;
    use crate::validation::validate_wtf_document;
    use approx::assert_relative_eq;

    fn converted() -> Document {
        RevAiConverter
            .convert_to_canonical(&fixtures::rev_ai_sample())
            .unwrap()
    }

    #[test]
    fn test_monologues_become_segments() {
        let doc = converted();
        assert_eq!(doc.segments.len(), 2);
        assert_eq!(doc.segments[0].text, "Hello world.");
        assert_eq!(doc.segments[1].speaker, Some(SpeakerId::Int(1)));
        assert_eq!(doc.transcript.text, "Hello world. Good morning.");
        assert_eq!(doc.words.len(), 4);
        assert_relative_eq!(doc.segments[0].confidence, 0.95, epsilon = 1e-9);
    }

    #[test]
    fn test_speaker_names_and_model() {
        let doc = converted();
        assert_eq!(doc.speakers[0].label.as_deref(), Some("Alice"));
        assert_eq!(doc.speakers[1].label, None);
        assert_eq!(
            doc.metadata.as_ref().map(|m| m.model.as_str()),
            Some("rev-ai-machine")
        );
        let (valid, errors) = validate_wtf_document(&doc);
        assert!(valid, "{errors:?}");
    }

    #[test]
    fn test_duration_derived_without_duration_seconds() {
        let doc = converted();
        assert_relative_eq!(doc.transcript.duration, 2.6);
    }

    #[test]
    fn test_round_trip_restores_punctuation() {
        let doc = converted();
        let raw = RevAiConverter.convert_from_canonical(&doc).unwrap();
        let elements = raw["monologues"][0]["elements"].as_array().unwrap();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[3]["value"], json!("."));
        assert_eq!(RevAiConverter.convert_to_canonical(&raw).unwrap(), doc);
    }

    #[test]
    fn test_singular_monologue_fallback() {
        let sample = json!({
            "monologue": {
                "speaker": 0,
                "elements": [
                    {"type": "text", "value": "Hi", "ts": 0.0, "end_ts": 0.4, "confidence": 0.9}
                ]
            }
        });
        let doc = RevAiConverter.convert_to_canonical(&sample).unwrap();
        assert_eq!(doc.segments.len(), 1);
        let raw = RevAiConverter.convert_from_canonical(&doc).unwrap();
        assert!(raw.get("monologues").is_none());
        assert_eq!(RevAiConverter.convert_to_canonical(&raw).unwrap(), doc);
    }

    #[test]
    fn test_monologue_without_timed_text_rejected() {
        let sample = json!({
            "monologues": [{"speaker": 0, "elements": [{"type": "punct", "value": "."}]}]
        });
        let err = RevAiConverter.convert_to_canonical(&sample).unwrap_err();
        assert_eq!(err.path(), Some("monologues[0].elements"));
    }

    #[test]
    fn test_missing_end_ts_rejected() {
        let sample = json!({
            "monologues": [{"speaker": 0, "elements": [{"type": "text", "value": "Hi", "ts": 0.0}]}]
        });
        let err = RevAiConverter.convert_to_canonical(&sample).unwrap_err();
        assert_eq!(err.path(), Some("monologues[0].elements[0].end_ts"));
    }

    #[test]
    fn test_words_required_on_write() {
        let doc = Document::new(Transcript::new("hello", "en-US", 1.0, 0.9));
        let err = RevAiConverter.convert_from_canonical(&doc).unwrap_err();
        assert!(matches!(err, ConversionError::MissingInformation { .. }));
    }

    #[test]
    fn test_foreign_document_gets_spaces_between_words() {
        let doc = Document::new(Transcript::new("a b", "en-US", 2.0, 0.9))
            .with_segments(vec![Segment::new(0.0, 2.0, "a b", 0.9).with_speaker(0)])
            .with_words(vec![
                Word::new("a", 0.0, 0.5, 0.9).with_speaker(0),
                Word::new("b", 0.6, 1.0, 0.9).with_speaker(0),
            ])
            .with_speakers(vec![Speaker::new(0).with_label("Host")]);
        let raw = RevAiConverter.convert_from_canonical(&doc).unwrap();
        let elements = raw["monologues"][0]["elements"].as_array().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[1], json!({"type": "punct", "value": " "}));
        assert_eq!(raw["monologues"][0]["speaker_name"], json!("Host"));
    }
}
