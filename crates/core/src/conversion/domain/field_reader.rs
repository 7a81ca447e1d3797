use serde::de::DeserializeOwned;
use serde_json::Value;

use super::conversion_error::ConversionError;
use crate::normalization::{
    canonicalize_language, is_out_of_range, ms_to_seconds, normalize_confidence,
    validate_seconds, ConfidenceScale,
};
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_LANGUAGE};

/// Reads provider fields, applying normalization and attributing failures to a field path.
#[derive(Clone, Copy, Debug)]
pub struct FieldReader {
    provider: &'static str,
}

impl FieldReader {
    pub fn new(provider: &'static str) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Decode a provider wire struct. Type mismatches surface as a shape error.
    pub fn decode<T: DeserializeOwned>(&self, value: &Value) -> Result<T, ConversionError> {
        T::deserialize(value).map_err(|e| ConversionError::InvalidShape {
            provider: self.provider.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn required<T>(&self, value: Option<T>, path: impl Into<String>) -> Result<T, ConversionError> {
        value.ok_or_else(|| self.missing(path))
    }

    pub fn missing(&self, path: impl Into<String>) -> ConversionError {
        ConversionError::MissingField {
            provider: self.provider.to_string(),
            path: path.into(),
        }
    }

    pub fn invalid(&self, path: impl Into<String>, reason: impl Into<String>) -> ConversionError {
        ConversionError::InvalidField {
            provider: self.provider.to_string(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// A timestamp already expressed in seconds.
    pub fn seconds(&self, value: f64, path: impl Into<String>) -> Result<f64, ConversionError> {
        validate_seconds(value).map_err(|e| self.invalid(path, e.to_string()))
    }

    pub fn required_seconds(
        &self,
        value: Option<f64>,
        path: impl Into<String>,
    ) -> Result<f64, ConversionError> {
        let path = path.into();
        let value = self.required(value, path.as_str())?;
        self.seconds(value, path)
    }

    /// A timestamp in milliseconds, returned in seconds.
    pub fn milliseconds(&self, value: f64, path: impl Into<String>) -> Result<f64, ConversionError> {
        ms_to_seconds(value).map_err(|e| self.invalid(path, e.to_string()))
    }

    pub fn required_milliseconds(
        &self,
        value: Option<f64>,
        path: impl Into<String>,
    ) -> Result<f64, ConversionError> {
        let path = path.into();
        let value = self.required(value, path.as_str())?;
        self.milliseconds(value, path)
    }

    /// Normalized confidence, [`DEFAULT_CONFIDENCE`] when absent. Out-of-range values are
    /// clamped with a warning.
    pub fn confidence(&self, value: Option<f64>, scale: ConfidenceScale, path: &str) -> f64 {
        match value {
            Some(raw) => {
                if is_out_of_range(raw, scale) {
                    log::warn!(
                        "{}: confidence {raw} at `{path}` is outside the {scale:?} range, clamping",
                        self.provider
                    );
                }
                normalize_confidence(raw, scale)
            }
            None => DEFAULT_CONFIDENCE,
        }
    }

    /// Canonical BCP-47 tag, defaulting to English.
    pub fn language(&self, value: Option<&str>) -> String {
        canonicalize_language(value.filter(|s| !s.trim().is_empty()).unwrap_or(DEFAULT_LANGUAGE))
    }
}
