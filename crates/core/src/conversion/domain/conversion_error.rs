use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("[{provider}] missing required field `{path}`")]
    MissingField { provider: String, path: String },
    #[error("[{provider}] invalid field `{path}`: {reason}")]
    InvalidField {
        provider: String,
        path: String,
        reason: String,
    },
    #[error("[{provider}] malformed input: {reason}")]
    InvalidShape { provider: String, reason: String },
    #[error("[{provider}] document lacks information the output requires: {reason}")]
    MissingInformation { provider: String, reason: String },
    #[error("malformed canonical document: {0}")]
    MalformedDocument(String),
}

impl ConversionError {
    /// Path of the offending field, when the error concerns one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConversionError::MissingField { path, .. }
            | ConversionError::InvalidField { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn provider(&self) -> Option<&str> {
        match self {
            ConversionError::MissingField { provider, .. }
            | ConversionError::InvalidField { provider, .. }
            | ConversionError::InvalidShape { provider, .. }
            | ConversionError::MissingInformation { provider, .. } => Some(provider),
            ConversionError::MalformedDocument(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message_names_path() {
        let err = ConversionError::MissingField {
            provider: "whisper".into(),
            path: "duration".into(),
        };
        assert_eq!(err.to_string(), "[whisper] missing required field `duration`");
        assert_eq!(err.path(), Some("duration"));
        assert_eq!(err.provider(), Some("whisper"));
    }

    #[test]
    fn test_shape_errors_have_no_path() {
        let err = ConversionError::InvalidShape {
            provider: "deepgram".into(),
            reason: "expected object".into(),
        };
        assert_eq!(err.path(), None);
        assert_eq!(ConversionError::MalformedDocument("x".into()).provider(), None);
    }
}
