//! Rolling-window statistics aligned with their input series.
//!
//! Every output has the same length as its input. A slot is `None` until a full
//! window of defined values is available, so callers can treat undefined
//! aggregates as "condition not met" without special-casing the warm-up.

/// Arithmetic mean, None for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), None below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let avg = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - avg;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Period-over-period fractional change; the first slot is undefined
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut changes = Vec::with_capacity(values.len());
    if values.is_empty() {
        return changes;
    }

    changes.push(None);
    for pair in values.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if prev == 0.0 {
            changes.push(None);
        } else {
            changes.push(Some(curr / prev - 1.0));
        }
    }
    changes
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, mean)
}

pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_apply(values, window, sample_std)
}

/// Rolling mean over a series that may contain undefined slots
pub fn rolling_mean_sparse(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply_sparse(values, window, mean)
}

/// Rolling sample standard deviation over a series that may contain undefined slots
pub fn rolling_std_sparse(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_apply_sparse(values, window, sample_std)
}

fn rolling_apply<F>(values: &[f64], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                f(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

fn rolling_apply_sparse<F>(values: &[Option<f64>], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut buffer = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            buffer.clear();
            for value in &values[i + 1 - window..=i] {
                buffer.push((*value)?);
            }
            f(&buffer)
        })
        .collect()
}
