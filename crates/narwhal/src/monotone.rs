//! Monotone regression helpers for non-metric scaling.

/// Least-squares non-decreasing fit of `values` (pool adjacent violators).
pub(crate) fn isotonic(values: &[f64], fitted: &mut Vec<f64>) {
    // (sum, count) per pooled block.
    let mut blocks: Vec<(f64, usize)> = Vec::with_capacity(values.len());
    for &v in values {
        blocks.push((v, 1));
        while blocks.len() > 1 {
            let (sum, count) = blocks[blocks.len() - 1];
            let (prev_sum, prev_count) = blocks[blocks.len() - 2];
            if prev_sum / prev_count as f64 <= sum / count as f64 {
                break;
            }
            blocks.pop();
            let last = blocks.len() - 1;
            blocks[last] = (prev_sum + sum, prev_count + count);
        }
    }

    fitted.clear();
    for (sum, count) in blocks {
        let mean = sum / count as f64;
        fitted.extend(std::iter::repeat_n(mean, count));
    }
}

/// Mean squared gap between each pair's dissimilarity and the dissimilarity holding the same
/// rank in `sorted_high`, with pairs ranked by (layout distance, dissimilarity). Zero when the
/// layout orders pairs exactly as the dissimilarities do.
pub(crate) fn rank_departure(
    low: &[f64],
    high: &[f64],
    sorted_high: &[f64],
    order: &mut Vec<usize>,
) -> f64 {
    debug_assert_eq!(low.len(), high.len());
    if low.is_empty() {
        return 0.0;
    }
    order.clear();
    order.extend(0..low.len());
    order.sort_by(|&a, &b| {
        low[a]
            .total_cmp(&low[b])
            .then_with(|| high[a].total_cmp(&high[b]))
    });
    let total: f64 = order
        .iter()
        .zip(sorted_high)
        .map(|(&k, &image)| {
            let gap = image - high[k];
            gap * gap
        })
        .sum();
    total / low.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{isotonic, rank_departure};

    #[test]
    fn isotonic_pools_violators() {
        let mut out = Vec::new();
        isotonic(&[1.0, 3.0, 2.0, 4.0, 0.0], &mut out);
        assert_eq!(out, vec![1.0, 2.25, 2.25, 2.25, 2.25]);

        isotonic(&[1.0, 2.0, 3.0], &mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);

        isotonic(&[], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn isotonic_fit_is_non_decreasing_and_preserves_the_sum() {
        let values = [5.0, 1.0, 4.0, 2.0, 2.0, 8.0, 7.0, 3.0];
        let mut out = Vec::new();
        isotonic(&values, &mut out);
        assert!(out.windows(2).all(|w| w[0] <= w[1]));
        let sum: f64 = values.iter().sum();
        assert!((out.iter().sum::<f64>() - sum).abs() < 1e-12);
    }

    #[test]
    fn rank_departure_is_zero_for_matching_orders() {
        let high = [0.1, 0.5, 0.3];
        let mut sorted = high.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mut order = Vec::new();
        assert_eq!(rank_departure(&[1.0, 9.0, 4.0], &high, &sorted, &mut order), 0.0);

        let swapped = rank_departure(&[9.0, 1.0, 4.0], &high, &sorted, &mut order);
        assert!(swapped > 0.0);
    }
}
