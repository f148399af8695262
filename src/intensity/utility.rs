/// Weighted arithmetic mean: `sum(v * w) / sum(w)`. Returns 0.0 when the weights sum to zero.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum == 0.0 {
        return 0.0;
    }
    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / weight_sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_mean() {
        assert!((weighted_mean(&[600.0, 400.0], &[0.6, 0.2]) - 550.0).abs() < 1e-9);
        assert_eq!(weighted_mean(&[10.0], &[1.0]), 10.0);
    }

    #[test]
    fn test_zero_weights() {
        assert_eq!(weighted_mean(&[], &[]), 0.0);
        assert_eq!(weighted_mean(&[5.0], &[0.0]), 0.0);
    }
}
