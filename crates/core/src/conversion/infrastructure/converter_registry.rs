use std::sync::OnceLock;

use serde_json::Value;

use super::assemblyai_converter::AssemblyAiConverter;
use super::deepgram_converter::DeepgramConverter;
use super::nemo_converter::NemoConverter;
use super::rev_ai_converter::RevAiConverter;
use super::whisper_converter::WhisperConverter;
use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::provider_error::ProviderError;
use crate::shared::constants::{ASSEMBLYAI, CANARY, DEEPGRAM, PARAKEET, REV_AI, WHISPER};

/// Named set of converters. Read-only once built, so it can be shared across threads.
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterRegistry {
    /// An empty registry, for embedding a custom provider set.
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::new()
            .with_converter(Box::new(WhisperConverter))
            .with_converter(Box::new(DeepgramConverter))
            .with_converter(Box::new(AssemblyAiConverter))
            .with_converter(Box::new(RevAiConverter))
            .with_converter(Box::new(NemoConverter::canary()))
            .with_converter(Box::new(NemoConverter::parakeet()))
    }

    /// Process-wide registry of the built-in providers, built on first use.
    pub fn global() -> &'static ConverterRegistry {
        static REGISTRY: OnceLock<ConverterRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::builtin)
    }

    /// Add a converter, replacing any registered under the same provider name.
    pub fn with_converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converters
            .retain(|c| c.provider_name() != converter.provider_name());
        self.converters.push(converter);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.provider_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Resolve a provider name. Case is ignored and `-`, `_` and spaces are interchangeable,
    /// so `Rev-AI`, `rev_ai` and `revai` name the same converter.
    pub fn get(&self, name: &str) -> Result<&dyn Converter, ProviderError> {
        let wanted = fold_name(name);
        self.converters
            .iter()
            .find(|c| fold_name(c.provider_name()) == wanted)
            .map(|c| c.as_ref())
            .ok_or_else(|| self.unknown(name))
    }

    /// Resolve every name, failing on the first unknown one.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&dyn Converter>, ProviderError> {
        names.iter().map(|n| self.get(n.as_ref())).collect()
    }

    pub fn converters(&self) -> impl Iterator<Item = &dyn Converter> {
        self.converters.iter().map(|c| c.as_ref())
    }

    /// Guess which registered provider produced `data` from its top-level shape.
    pub fn detect_provider(&self, data: &Value) -> Option<&'static str> {
        let guess = guess_provider(data)?;
        self.get(guess).ok().map(|c| c.provider_name())
    }

    fn unknown(&self, name: &str) -> ProviderError {
        ProviderError::UnknownProvider {
            name: name.to_string(),
            available: self.names().into_iter().map(String::from).collect(),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn guess_provider(data: &Value) -> Option<&'static str> {
    let obj = data.as_object()?;
    if obj.contains_key("results") && obj.contains_key("metadata") {
        return Some(DEEPGRAM);
    }
    if obj.contains_key("monologues") || obj.contains_key("monologue") {
        return Some(REV_AI);
    }
    if obj.contains_key("audio_duration") || obj.contains_key("language_code") {
        return Some(ASSEMBLYAI);
    }

    let model = obj.get("model").and_then(Value::as_str).unwrap_or_default();
    let model = model.to_lowercase();
    if model.contains("canary") {
        return Some(CANARY);
    }
    if model.contains("parakeet") || obj.contains_key("sample_rate") {
        return Some(PARAKEET);
    }

    let has_logprob = obj
        .get("segments")
        .and_then(Value::as_array)
        .is_some_and(|segs| segs.iter().any(|s| s.get("avg_logprob").is_some()));
    if has_logprob || obj.contains_key("task") || obj.contains_key("text") {
        return Some(WHISPER);
    }
    None
}
