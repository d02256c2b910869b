//! This module contains the aggregations used to summarize groups of listings.
use std::collections::BTreeMap;

/// Arithmetic mean of all values.
/// # Returns
/// None if `values` produces no values.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    // running mean, a plain sum overflows for values close to f64::MAX
    let (count, average) = values
        .into_iter()
        .fold((0usize, 0.0), |(count, average), value| {
            let count = count + 1;
            (count, average + (value - average) / count as f64)
        });
    if count == 0 {
        None
    } else {
        Some(average)
    }
}

/// Median of all values. For an even number of values the mean of the two middle ones is used.
/// NaN values are ignored.
/// # Returns
/// None if `values` produces no values.
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|value| !value.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).expect("we have no NaNs"));

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(sorted[middle - 1] + (sorted[middle] - sorted[middle - 1]) / 2.0)
    } else {
        Some(sorted[middle])
    }
}

/// The most common label.
/// Ties are broken towards the lexicographically smallest label, so the result does not depend
/// on the order of `labels`.
/// # Returns
/// None if `labels` produces no labels.
pub fn mode<'i>(labels: impl IntoIterator<Item = &'i str>) -> Option<&'i str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    weighted_mode_of(counts.into_iter().map(|(label, count)| (label, count as f64)))
}

/// The label with the highest total weight, ties broken towards the smallest label.
/// `weighted_labels` must be sorted by label and free of duplicates.
fn weighted_mode_of<L: Ord>(weighted_labels: impl Iterator<Item = (L, f64)>) -> Option<L> {
    // strict comparison keeps the first, i.e. smallest, label among equal weights
    weighted_labels.fold(None, |best: Option<(L, f64)>, (label, weight)| match best {
        Some((_, best_weight)) if weight <= best_weight => best,
        _ => Some((label, weight)),
    })
    .map(|(label, _)| label)
}

/// This function calculates a weighted average oversome some values.
/// Let W be the sum of all weights, then this function computes
/// \Sum_{v \in Values} \frac{weight(v)}{W} value(v).
/// If `W` is 0 then NaN might be returned.
/// # Returns
/// None if `values` produces no values.
pub fn calculate_weighted_average<T, V, F>(
    values: impl IntoIterator<Item = T>,
    value_function: V,
    weight_function: F,
) -> Option<f64>
where
    V: Fn(&T) -> f64,
    F: Fn(&T) -> f64,
{
    let opt = values
        .into_iter()
        .map(|object| (value_function(&object), weight_function(&object)))
        .fold(None, |value_opt, (cur_value, cur_weight)| match value_opt {
            Some((weighted_sum, weight_total)) => Some((
                weighted_sum + cur_weight * cur_value,
                weight_total + cur_weight,
            )),
            None => Some((cur_weight * cur_value, cur_weight)),
        });
    opt.map(|(weighted_sum, weight_total)| weighted_sum / weight_total)
}

/// Calculates which label collects the highest sum of weights.
/// Ties are broken towards the smallest label.
/// Objects for which `label_function` gives None don't vote.
/// # Returns
/// None if no object has a label.
pub fn calculate_weighted_vote<T, L, V, F>(
    objects: impl IntoIterator<Item = T>,
    label_function: V,
    weight_function: F,
) -> Option<L>
where
    L: Ord,
    V: Fn(&T) -> Option<L>,
    F: Fn(&T) -> f64,
{
    let mut totals: BTreeMap<L, f64> = BTreeMap::new();
    for object in objects {
        if let Some(label) = label_function(&object) {
            *totals.entry(label).or_default() += weight_function(&object);
        }
    }
    weighted_mode_of(totals.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use proptest::prelude::*;

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(Vec::new()), None);
        assert_approx_eq!(mean(vec![100.0, 120.0]).unwrap(), 110.0);
    }

    #[test]
    fn huge_values_do_not_overflow() {
        assert_eq!(mean(vec![f64::MAX, f64::MAX]), Some(f64::MAX));
        assert_eq!(median(vec![f64::MAX, f64::MAX]), Some(f64::MAX));
    }

    #[test]
    fn median_examples() {
        assert_eq!(median(Vec::new()), None);
        assert_approx_eq!(median(vec![3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_approx_eq!(median(vec![4.0, 1.0, 2.0, 3.0]).unwrap(), 2.5);
    }

    #[test]
    fn mode_breaks_ties_lexicographically() {
        assert_eq!(mode(vec!["b", "a"]), Some("a"));
        assert_eq!(mode(vec!["b", "a", "b"]), Some("b"));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn weighted_vote_prefers_heavier_label() {
        let votes = vec![("flat", 1.0), ("house", 0.5), ("house", 0.6)];
        let winner = calculate_weighted_vote(votes, |(label, _)| Some(*label), |(_, w)| *w);
        assert_eq!(winner, Some("house"));
    }

    #[test]
    fn weighted_vote_skips_unlabeled() {
        let votes: Vec<(Option<u32>, f64)> = vec![(None, 10.0), (Some(3), 0.1)];
        let winner = calculate_weighted_vote(votes, |(label, _)| *label, |(_, w)| *w);
        assert_eq!(winner, Some(3));
    }

    #[test]
    fn weighted_average_example() {
        let values = vec![(1.0, 1.0), (4.0, 2.0)];
        let average = calculate_weighted_average(values, |(v, _)| *v, |(_, w)| *w).unwrap();
        assert_approx_eq!(average, 3.0);
    }

    proptest! {
        #[test]
        fn mode_does_not_depend_on_order(mut labels in prop::collection::vec("[a-c]", 1..64)) {
            let forward = mode(labels.iter().map(String::as_str)).map(String::from);
            labels.reverse();
            let backward = mode(labels.iter().map(String::as_str)).map(String::from);
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn mean_lies_between_extremes(values in prop::collection::vec(-1e6..1e6f64, 1..64)) {
            let average = mean(values.iter().copied()).unwrap();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(min - 1e-6 <= average && average <= max + 1e-6);
        }
    }
}
