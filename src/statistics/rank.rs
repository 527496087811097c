//! Rank transforms and summary statistics over dissimilarity vectors.

/// Rank-transform a vector, giving tied values the average of their ranks.
///
/// Ranks start at 1. Sorting uses `total_cmp`, so NaN values rank last.
///
/// # Example
///
/// ```
/// use rdm_inference::statistics::rank_average;
///
/// assert_eq!(rank_average(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
/// ```
pub fn rank_average(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && data[order[end]] == data[order[start]] {
            end += 1;
        }
        // Positions start..end share the average of ranks start+1..=end
        let avg = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (ddof = 0).
pub fn std_population(data: &[f64]) -> f64 {
    let mu = mean(data);
    let var = data.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}
