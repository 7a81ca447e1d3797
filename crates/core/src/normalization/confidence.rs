/// How a provider expresses confidence before normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceScale {
    /// Natural-log probability, e.g. Whisper's `avg_logprob`.
    LogProbability,
    /// Percentage in `[0, 100]`.
    Percentage,
    /// Already in `[0, 1]`.
    UnitInterval,
}

/// Map a raw confidence onto `[0, 1]`. Never fails; NaN maps to `0.0`.
pub fn normalize_confidence(value: f64, scale: ConfidenceScale) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let mapped = match scale {
        ConfidenceScale::LogProbability => value.exp(),
        ConfidenceScale::Percentage => value / 100.0,
        ConfidenceScale::UnitInterval => value,
    };
    mapped.clamp(0.0, 1.0)
}

/// True when `value` would be altered by [`normalize_confidence`] on the given scale.
pub fn is_out_of_range(value: f64, scale: ConfidenceScale) -> bool {
    match scale {
        ConfidenceScale::LogProbability => value.is_nan() || value > 0.0,
        ConfidenceScale::Percentage => !(0.0..=100.0).contains(&value),
        ConfidenceScale::UnitInterval => !(0.0..=1.0).contains(&value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_log_probability_example() {
        assert_relative_eq!(
            normalize_confidence(-0.4, ConfidenceScale::LogProbability),
            0.6703,
            epsilon = 1e-3
        );
    }

    #[rstest]
    #[case::log_zero(0.0, ConfidenceScale::LogProbability, 1.0)]
    #[case::log_positive(2.0, ConfidenceScale::LogProbability, 1.0)]
    #[case::log_very_negative(-1000.0, ConfidenceScale::LogProbability, 0.0)]
    #[case::percent(85.0, ConfidenceScale::Percentage, 0.85)]
    #[case::percent_over(150.0, ConfidenceScale::Percentage, 1.0)]
    #[case::percent_negative(-5.0, ConfidenceScale::Percentage, 0.0)]
    #[case::unit(0.42, ConfidenceScale::UnitInterval, 0.42)]
    #[case::unit_over(1.2, ConfidenceScale::UnitInterval, 1.0)]
    #[case::unit_under(-0.1, ConfidenceScale::UnitInterval, 0.0)]
    fn test_normalize(#[case] raw: f64, #[case] scale: ConfidenceScale, #[case] expected: f64) {
        assert_relative_eq!(normalize_confidence(raw, scale), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case::log(ConfidenceScale::LogProbability)]
    #[case::percent(ConfidenceScale::Percentage)]
    #[case::unit(ConfidenceScale::UnitInterval)]
    fn test_nan_maps_to_zero(#[case] scale: ConfidenceScale) {
        assert_eq!(normalize_confidence(f64::NAN, scale), 0.0);
    }

    #[test]
    fn test_infinities_are_clamped() {
        assert_eq!(normalize_confidence(f64::INFINITY, ConfidenceScale::UnitInterval), 1.0);
        assert_eq!(
            normalize_confidence(f64::NEG_INFINITY, ConfidenceScale::LogProbability),
            0.0
        );
    }

    #[rstest]
    #[case::unit_ok(0.5, ConfidenceScale::UnitInterval, false)]
    #[case::unit_bad(1.5, ConfidenceScale::UnitInterval, true)]
    #[case::log_ok(-0.3, ConfidenceScale::LogProbability, false)]
    #[case::log_bad(0.3, ConfidenceScale::LogProbability, true)]
    #[case::percent_bad(101.0, ConfidenceScale::Percentage, true)]
    fn test_out_of_range(#[case] raw: f64, #[case] scale: ConfidenceScale, #[case] expected: bool) {
        assert_eq!(is_out_of_range(raw, scale), expected);
    }
}
