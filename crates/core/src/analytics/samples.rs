use std::collections::HashSet;

use serde_json::Value;

use crate::conversion::domain::converter::Converter;
use crate::conversion::domain::provider_error::ProviderError;
use crate::conversion::infrastructure::converter_registry::ConverterRegistry;

/// Raw provider output handed to an analyzer.
///
/// Either one sample run through several providers, or a separate sample per provider
/// (each in that provider's own shape, all describing the same audio).
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderSamples {
    Shared { sample: Value, providers: Vec<String> },
    PerProvider(Vec<(String, Value)>),
}

impl ProviderSamples {
    pub fn shared<I, S>(sample: Value, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Shared {
            sample,
            providers: providers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn per_provider<I, S>(samples: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self::PerProvider(samples.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    pub fn provider_names(&self) -> Vec<&str> {
        match self {
            Self::Shared { providers, .. } => providers.iter().map(String::as_str).collect(),
            Self::PerProvider(samples) => samples.iter().map(|(n, _)| n.as_str()).collect(),
        }
    }

    /// Pair every requested provider with its converter and input, in request order.
    /// Any unknown name, or two names resolving to the same provider, fails the whole
    /// lookup before anything is converted.
    pub fn resolve<'a>(
        &'a self,
        registry: &'a ConverterRegistry,
    ) -> Result<Vec<(&'a dyn Converter, &'a Value)>, ProviderError> {
        let resolved: Vec<(&dyn Converter, &Value)> = match self {
            Self::Shared { sample, providers } => registry
                .resolve(providers)?
                .into_iter()
                .map(|c| (c, sample))
                .collect(),
            Self::PerProvider(samples) => samples
                .iter()
                .map(|(name, sample)| registry.get(name).map(|c| (c, sample)))
                .collect::<Result<_, _>>()?,
        };

        let mut seen = HashSet::new();
        for (converter, _) in &resolved {
            if !seen.insert(converter.provider_name()) {
                return Err(ProviderError::DuplicateProvider {
                    name: converter.provider_name().to_string(),
                });
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shared_resolves_in_order() {
        let samples = ProviderSamples::shared(json!({}), ["deepgram", "Whisper"]);
        let registry = ConverterRegistry::builtin();
        let resolved = samples.resolve(&registry).unwrap();
        let names: Vec<_> = resolved.iter().map(|(c, _)| c.provider_name()).collect();
        assert_eq!(names, vec!["deepgram", "whisper"]);
    }

    #[test]
    fn test_unknown_name_fails_up_front() {
        let samples = ProviderSamples::per_provider([("whisper", json!({})), ("otter", json!({}))]);
        let err = samples.resolve(&ConverterRegistry::builtin()).err().unwrap();
        assert!(err.to_string().contains("otter"));
    }

    #[test]
    fn test_same_provider_twice_is_rejected() {
        let samples = ProviderSamples::per_provider([
            ("whisper", json!({"text": "one"})),
            ("Whisper", json!({"text": "two"})),
            ("deepgram", json!({})),
        ]);
        let err = samples.resolve(&ConverterRegistry::builtin()).err().unwrap();
        assert_eq!(
            err,
            ProviderError::DuplicateProvider {
                name: "whisper".into()
            }
        );
    }

    #[test]
    fn test_aliases_of_one_provider_are_rejected() {
        let samples = ProviderSamples::shared(json!({}), ["rev-ai", "rev_ai"]);
        let err = samples.resolve(&ConverterRegistry::builtin()).err().unwrap();
        assert!(err.to_string().contains("rev_ai"));
    }

    #[test]
    fn test_provider_names_keep_request_spelling() {
        let samples = ProviderSamples::shared(json!({}), ["rev-ai"]);
        assert_eq!(samples.provider_names(), vec!["rev-ai"]);
    }
}
