//! Comparing a single prediction with the real values, field by field.
use std::collections::BTreeMap;

use common::{CategoricalTarget, Listing, NumericTarget};
use serde::Serialize;

/// How a predicted value compares to the real one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldComparison {
    /// A numeric target and the absolute difference.
    Numerical {
        /// The predicted value.
        predicted: f64,
        /// The real value.
        actual: f64,
        /// The absolute difference.
        error: f64,
    },
    /// A categorical target and whether the labels are equal.
    Categorical {
        /// The predicted label.
        predicted: String,
        /// The real label.
        actual: String,
        /// Are both labels the same?
        #[serde(rename = "match")]
        matches: bool,
    },
}

/// Compares every target set in both `predicted` and `actual`, keyed by column name.
/// # Example
/// ```
/// # use common::ListingBuilder;
/// # use evaluators::{evaluate_predictions, FieldComparison};
/// let actual = ListingBuilder::default().price(100.0).room_type("Private room").build().unwrap();
/// let predicted = ListingBuilder::default().price(90.0).room_type("Shared room").beds(1).build().unwrap();
///
/// let comparison = evaluate_predictions(&predicted, &actual);
/// assert_eq!(comparison.len(), 2);
/// assert_eq!(
///     comparison["price"],
///     FieldComparison::Numerical { predicted: 90.0, actual: 100.0, error: 10.0 }
/// );
/// ```
pub fn evaluate_predictions(
    predicted: &Listing,
    actual: &Listing,
) -> BTreeMap<&'static str, FieldComparison> {
    let mut comparisons = BTreeMap::new();

    for &target in NumericTarget::ALL.iter() {
        if let (Some(predicted), Some(actual)) =
            (predicted.numeric_target(target), actual.numeric_target(target))
        {
            comparisons.insert(
                target.name(),
                FieldComparison::Numerical {
                    predicted,
                    actual,
                    error: (predicted - actual).abs(),
                },
            );
        }
    }

    for &target in CategoricalTarget::ALL.iter() {
        if let (Some(predicted), Some(actual)) = (
            predicted.categorical_target(target),
            actual.categorical_target(target),
        ) {
            comparisons.insert(
                target.name(),
                FieldComparison::Categorical {
                    predicted: predicted.to_string(),
                    actual: actual.to_string(),
                    matches: predicted == actual,
                },
            );
        }
    }

    comparisons
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_helpers::*;

    #[test]
    fn serializes_like_a_report() {
        let comparison = FieldComparison::Categorical {
            predicted: "Loft".into(),
            actual: "Loft".into(),
            matches: true,
        };
        assert_eq!(
            serde_json::to_string(&comparison).unwrap(),
            r#"{"type":"categorical","predicted":"Loft","actual":"Loft","match":true}"#
        );
    }

    proptest! {
        #[test]
        fn identical_listings_match_everywhere(listing in full_listing()) {
            let comparison = evaluate_predictions(&listing, &listing);

            let expected_len = 7 + usize::from(listing.bathrooms_text.is_some());
            prop_assert_eq!(comparison.len(), expected_len);
            for field in comparison.values() {
                match field {
                    FieldComparison::Numerical { error, .. } => prop_assert_eq!(*error, 0.0),
                    FieldComparison::Categorical { matches, .. } => prop_assert!(*matches),
                }
            }
        }
    }
}
