use super::NormalizationError;

/// Check that a timestamp in seconds is finite and non-negative.
pub fn validate_seconds(value: f64) -> Result<f64, NormalizationError> {
    if !value.is_finite() {
        return Err(NormalizationError::NonFiniteTimestamp { value });
    }
    if value < 0.0 {
        return Err(NormalizationError::NegativeTimestamp { value });
    }
    Ok(value)
}

pub fn ms_to_seconds(ms: f64) -> Result<f64, NormalizationError> {
    validate_seconds(ms).map(|ms| ms / 1000.0)
}

/// Seconds to whole milliseconds, as providers using ms timestamps expect.
pub fn seconds_to_ms(seconds: f64) -> Result<i64, NormalizationError> {
    validate_seconds(seconds).map(|s| (s * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0.0, 0.0)]
    #[case::whole(1500.0, 1.5)]
    #[case::fractional(250.0, 0.25)]
    fn test_ms_to_seconds(#[case] ms: f64, #[case] expected: f64) {
        assert_relative_eq!(ms_to_seconds(ms).unwrap(), expected);
    }

    #[rstest]
    #[case::whole(1.5, 1500)]
    #[case::rounds(0.1234, 123)]
    #[case::rounds_up(2.0006, 2001)]
    fn test_seconds_to_ms(#[case] seconds: f64, #[case] expected: i64) {
        assert_eq!(seconds_to_ms(seconds).unwrap(), expected);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            ms_to_seconds(-1.0),
            Err(NormalizationError::NegativeTimestamp { .. })
        ));
        assert!(seconds_to_ms(-0.5).is_err());
    }

    #[rstest]
    #[case::nan(f64::NAN)]
    #[case::inf(f64::INFINITY)]
    #[case::neg_inf(f64::NEG_INFINITY)]
    fn test_non_finite_rejected(#[case] value: f64) {
        assert!(matches!(
            validate_seconds(value),
            Err(NormalizationError::NonFiniteTimestamp { .. })
        ));
    }
}
