//! Smoothed Moving Average (SMMA), also known as Wilder's smoothing.

/// SMMA of `values` over `period`.
///
/// The first output is the simple average of the first `period` values; each
/// later output is `(previous * (period - 1) + value) / period`. Returns an
/// empty vector when `period` is zero or exceeds the input length, otherwise
/// `values.len() - period + 1` outputs.
pub fn smma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let weight = period as f64;
    let seed = values[..period].iter().sum::<f64>() / weight;

    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(seed);

    let mut current = seed;
    for value in &values[period..] {
        current = (current * (weight - 1.0) + value) / weight;
        result.push(current);
    }

    result
}
