// Descriptive statistics shared by the extractors.
// Population moments, matching how sentence-level distributions are summarized.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Fisher-Pearson skewness. Zero for fewer than 3 samples or a flat sample.
pub fn skewness(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let m = mean(values);
    let n = values.len() as f64;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    m3 / m2.powf(1.5)
}
