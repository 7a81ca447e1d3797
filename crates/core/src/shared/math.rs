//! Small numeric helpers shared by the model, converters and analyzers.

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Total length covered by the union of `[start, end]` intervals, clipped to `[0, limit]`.
///
/// Overlapping intervals are counted once; inverted intervals contribute nothing.
pub fn covered_length(intervals: &[(f64, f64)], limit: f64) -> f64 {
    let mut spans: Vec<(f64, f64)> = intervals
        .iter()
        .map(|&(s, e)| (s.max(0.0), e.min(limit)))
        .filter(|&(s, e)| e > s)
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut total = 0.0;
    let mut current: Option<(f64, f64)> = None;
    for (s, e) in spans {
        match current {
            Some((cs, ce)) if s <= ce => current = Some((cs, ce.max(e))),
            Some((cs, ce)) => {
                total += ce - cs;
                current = Some((s, e));
            }
            None => current = Some((s, e)),
        }
    }
    if let Some((cs, ce)) = current {
        total += ce - cs;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_of_values() {
        assert_relative_eq!(mean(&[0.5, 1.0, 0.0]).unwrap(), 0.5);
    }

    #[test]
    fn test_covered_length_merges_overlaps() {
        let spans = [(0.0, 2.0), (1.0, 3.0), (5.0, 6.0)];
        assert_relative_eq!(covered_length(&spans, 10.0), 4.0);
    }

    #[test]
    fn test_covered_length_clips_to_limit() {
        let spans = [(8.0, 12.0)];
        assert_relative_eq!(covered_length(&spans, 10.0), 2.0);
    }

    #[test]
    fn test_covered_length_ignores_inverted_spans() {
        let spans = [(3.0, 1.0)];
        assert_relative_eq!(covered_length(&spans, 10.0), 0.0);
    }
}
