//! Pure functions shared by every converter: confidence scales, timestamp units and
//! language tags.

pub mod confidence;
pub mod language;
pub mod timestamp;

use thiserror::Error;

pub use confidence::{is_out_of_range, normalize_confidence, ConfidenceScale};
pub use language::{canonicalize_language, is_valid_bcp47};
pub use timestamp::{ms_to_seconds, seconds_to_ms, validate_seconds};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("negative timestamp: {value}")]
    NegativeTimestamp { value: f64 },
    #[error("non-finite timestamp: {value}")]
    NonFiniteTimestamp { value: f64 },
}
