//! Canonical transcript documents, converters for speech-recognition provider output,
//! validation and cross-provider analytics.
//!
//! Everything here is an in-memory transformation over `serde_json::Value`; callers own
//! all file and network I/O.

pub mod analytics;
pub mod conversion;
pub mod model;
pub mod normalization;
pub mod validation;

pub mod shared {
    pub mod constants;
    pub mod math;
}

pub use conversion::domain::conversion_error::ConversionError;
pub use conversion::domain::converter::Converter;
pub use conversion::domain::provider_error::ProviderError;
pub use conversion::infrastructure::converter_registry::ConverterRegistry;
pub use model::Document;
pub use normalization::NormalizationError;
pub use validation::{validate_wtf_document, ValidationError, ValidationReport, Validator};
