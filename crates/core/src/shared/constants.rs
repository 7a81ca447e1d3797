/// Confidence reported when a provider omits one for a span.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Tokens scoring below this are counted as low-confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Slack allowed when comparing timestamps (seconds) to absorb float noise.
pub const TIME_EPSILON: f64 = 1e-6;

/// Floor used before taking a logarithm of a confidence.
pub const MIN_LOG_CONFIDENCE: f64 = 1e-10;

pub const DEFAULT_BENCHMARK_ITERATIONS: usize = 3;

pub const DEFAULT_LANGUAGE: &str = "en";

pub const WHISPER: &str = "whisper";
pub const DEEPGRAM: &str = "deepgram";
pub const ASSEMBLYAI: &str = "assemblyai";
pub const REV_AI: &str = "rev_ai";
pub const CANARY: &str = "canary";
pub const PARAKEET: &str = "parakeet";

pub const WHISPER_DEFAULT_MODEL: &str = "whisper-1";
pub const DEEPGRAM_DEFAULT_MODEL: &str = "deepgram";
pub const ASSEMBLYAI_DEFAULT_MODEL: &str = "best";
pub const REV_AI_TRANSCRIBER: &str = "machine";
pub const CANARY_DEFAULT_MODEL: &str = "nvidia/canary-1b-v2";
pub const PARAKEET_DEFAULT_MODEL: &str = "nvidia/parakeet-tdt-0.6b-v3";
