use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::conversion::domain::conversion_error::ConversionError;

/// A provider that could not be analyzed. Recorded in the report; the other providers
/// still run.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: ConversionError,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, error: ConversionError) -> Self {
        let provider = provider.into();
        log::warn!("{provider}: excluded from analysis: {error}");
        Self { provider, error }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: FAILED ({})", self.provider, self.error)
    }
}

impl Serialize for ProviderFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProviderFailure", 2)?;
        state.serialize_field("provider", &self.provider)?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}
