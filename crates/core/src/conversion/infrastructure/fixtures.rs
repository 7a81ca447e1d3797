//! Captured provider responses for the same short clip, trimmed to what the converters read.

use serde_json::{json, Value};

pub(crate) fn whisper_sample() -> Value {
    json!({
        "task": "transcribe",
        "language": "english",
        "duration": 3.0,
        "text": "Hello world. How are you?",
        "segments": [
            {
                "id": 0,
                "seek": 0,
                "start": 0.0,
                "end": 1.0,
                "text": " Hello world.",
                "avg_logprob": -0.4,
                "compression_ratio": 0.8,
                "no_speech_prob": 0.01,
                "words": [
                    {"word": "Hello", "start": 0.0, "end": 0.5, "probability": 0.98},
                    {"word": "world.", "start": 0.5, "end": 1.0, "probability": 0.95}
                ]
            },
            {
                "id": 1,
                "seek": 0,
                "start": 1.5,
                "end": 2.9,
                "text": " How are you?",
                "avg_logprob": -0.3,
                "compression_ratio": 0.8,
                "no_speech_prob": 0.02,
                "words": [
                    {"word": "How", "start": 1.5, "end": 1.9, "probability": 0.9},
                    {"word": "are", "start": 1.9, "end": 2.3, "probability": 0.92},
                    {"word": "you?", "start": 2.3, "end": 2.9, "probability": 0.93}
                ]
            }
        ]
    })
}

pub(crate) fn deepgram_sample() -> Value {
    json!({
        "metadata": {
            "request_id": "req-123",
            "created": "2024-01-15T10:30:00.000Z",
            "duration": 3.0,
            "channels": 1,
            "model_info": {
                "1ed36bac-f71c-4f3f-a31f-02fd6525c489": {
                    "name": "general-nova-2",
                    "version": "2024-01-09.29447",
                    "arch": "nova-2"
                }
            }
        },
        "results": {
            "channels": [
                {
                    "detected_language": "en",
                    "alternatives": [
                        {
                            "transcript": "Hello world. How are you?",
                            "confidence": 0.93,
                            "words": [
                                {"word": "hello", "punctuated_word": "Hello", "start": 0.0, "end": 0.5, "confidence": 0.98, "speaker": 0},
                                {"word": "world", "punctuated_word": "world.", "start": 0.5, "end": 1.0, "confidence": 0.95, "speaker": 0},
                                {"word": "how", "punctuated_word": "How", "start": 1.5, "end": 1.9, "confidence": 0.9, "speaker": 1},
                                {"word": "are", "punctuated_word": "are", "start": 1.9, "end": 2.3, "confidence": 0.92, "speaker": 1},
                                {"word": "you", "punctuated_word": "you?", "start": 2.3, "end": 2.9, "confidence": 0.93, "speaker": 1}
                            ]
                        }
                    ]
                },
                {
                    "alternatives": [
                        {"transcript": "", "confidence": 0.0, "words": []}
                    ]
                }
            ],
            "utterances": [
                {"id": "u-1", "channel": 0, "start": 0.0, "end": 1.0, "confidence": 0.96, "transcript": "Hello world.", "speaker": 0},
                {"id": "u-2", "channel": 0, "start": 1.5, "end": 2.9, "confidence": 0.92, "transcript": "How are you?", "speaker": 1}
            ]
        }
    })
}

pub(crate) fn assemblyai_sample() -> Value {
    json!({
        "id": "tx-42",
        "status": "completed",
        "language_code": "en",
        "audio_duration": 3.0,
        "confidence": 0.93,
        "text": "Hello world. How are you?",
        "words": [
            {"text": "Hello", "start": 100, "end": 500, "confidence": 0.98, "speaker": "A"},
            {"text": "world.", "start": 500, "end": 1000, "confidence": 0.95, "speaker": "A"},
            {"text": "How", "start": 1500, "end": 1900, "confidence": 0.9, "speaker": "B"},
            {"text": "are", "start": 1900, "end": 2300, "confidence": 0.92, "speaker": "B"},
            {"text": "you?", "start": 2300, "end": 2900, "confidence": 0.93, "speaker": "B"}
        ],
        "utterances": [
            {"text": "Hello world.", "start": 100, "end": 1000, "confidence": 0.96, "speaker": "A"},
            {"text": "How are you?", "start": 1500, "end": 2900, "confidence": 0.92, "speaker": "B"}
        ]
    })
}

pub(crate) fn rev_ai_sample() -> Value {
    json!({
        "id": "rev-7",
        "monologues": [
            {
                "speaker": 0,
                "speaker_name": "Alice",
                "elements": [
                    {"type": "text", "value": "Hello", "ts": 0.0, "end_ts": 0.5, "confidence": 0.96},
                    {"type": "punct", "value": " "},
                    {"type": "text", "value": "world", "ts": 0.6, "end_ts": 1.0, "confidence": 0.94},
                    {"type": "punct", "value": "."}
                ]
            },
            {
                "speaker": 1,
                "elements": [
                    {"type": "text", "value": "Good", "ts": 1.5, "end_ts": 1.9, "confidence": 0.9},
                    {"type": "punct", "value": " "},
                    {"type": "text", "value": "morning", "ts": 2.0, "end_ts": 2.6, "confidence": 0.92},
                    {"type": "punct", "value": "."}
                ]
            }
        ]
    })
}

pub(crate) fn nemo_sample() -> Value {
    json!({
        "audio_path": "/tmp/sample.wav",
        "text": "Hello world. Good morning.",
        "language": "en",
        "duration": 3.0,
        "model": "nvidia/parakeet-tdt-0.6b-v3",
        "sample_rate": 16000,
        "segments": [
            {"id": 0, "start": 0.0, "end": 1.0, "text": "Hello world.", "confidence": 0.92, "words": [0, 1]},
            {"id": 1, "start": 1.5, "end": 2.6, "text": "Good morning.", "confidence": 0.88, "words": [2, 3]}
        ],
        "words": [
            {"id": 0, "start": 0.0, "end": 0.5, "text": "Hello", "confidence": 0.95},
            {"id": 1, "start": 0.5, "end": 1.0, "text": "world.", "confidence": 0.9},
            {"id": 2, "start": 1.5, "end": 1.9, "text": "Good", "confidence": 0.87},
            {"id": 3, "start": 2.0, "end": 2.6, "text": "morning.", "confidence": 0.89}
        ]
    })
}

/// Sample response for a registered provider name.
pub(crate) fn sample_for(provider: &str) -> Option<Value> {
    match provider {
        "whisper" => Some(whisper_sample()),
        "deepgram" => Some(deepgram_sample()),
        "assemblyai" => Some(assemblyai_sample()),
        "rev_ai" => Some(rev_ai_sample()),
        "canary" | "parakeet" => Some(nemo_sample()),
        _ => None,
    }
}
