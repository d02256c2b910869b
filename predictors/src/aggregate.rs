//! The summary of a group of listings, and how it is turned into a [ListingPrediction].
use std::{iter::once, str::FromStr};

use algorithms::aggregation::{mean, median, mode};
use common::{
    listing::{MIN_BATHROOMS, MIN_COUNT},
    CategoricalTarget, Listing, ListingPrediction, NumericTarget,
};
use serde::{Deserialize, Serialize};

/// The smallest positive price with two decimals.
pub const MIN_PRICE: f64 = 0.01;

/// Determines how the numeric targets of several listings are combined.
/// Categorical targets always use the most common label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Arithmetic mean.
    Mean,
    /// Median, the mean of the two middle values for an even count.
    Median,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Mean
    }
}

impl Aggregation {
    /// Combines the values. None if there are none.
    pub fn aggregate(self, values: impl IntoIterator<Item = f64>) -> Option<f64> {
        match self {
            Aggregation::Mean => mean(values),
            Aggregation::Median => median(values),
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            other => Err(format!("Unknown aggregation '{}', use mean or median", other)),
        }
    }
}

/// Raw, not yet rounded, target values summarizing a group of listings.
/// Used for a single host as well as for the whole training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TargetAggregate {
    pub property_type: String,
    pub room_type: String,
    pub bathrooms_text: Option<String>,
    pub accommodates: f64,
    pub bathrooms: f64,
    pub bedrooms: f64,
    pub beds: f64,
    pub price: f64,
}

impl TargetAggregate {
    /// Builds an aggregate from one function per target kind.
    /// Returns None if a numeric target or a required categorical target has no value.
    pub fn try_from_fn<N, C>(numeric: N, categorical: C) -> Option<Self>
    where
        N: Fn(NumericTarget) -> Option<f64>,
        C: Fn(CategoricalTarget) -> Option<String>,
    {
        Some(Self {
            property_type: categorical(CategoricalTarget::PropertyType)?,
            room_type: categorical(CategoricalTarget::RoomType)?,
            bathrooms_text: categorical(CategoricalTarget::BathroomsText),
            accommodates: numeric(NumericTarget::Accommodates)?,
            bathrooms: numeric(NumericTarget::Bathrooms)?,
            bedrooms: numeric(NumericTarget::Bedrooms)?,
            beds: numeric(NumericTarget::Beds)?,
            price: numeric(NumericTarget::Price)?,
        })
    }

    /// Summarizes `listings`: the mode of every categorical target and the `aggregation` of
    /// every numeric target. Unset values are skipped.
    /// Returns None if some required target is unset in all listings.
    pub fn from_listings(listings: &[&Listing], aggregation: Aggregation) -> Option<Self> {
        Self::try_from_fn(
            |target| aggregation.aggregate(listings.iter().filter_map(|l| l.numeric_target(target))),
            |target| {
                mode(listings.iter().filter_map(|l| l.categorical_target(target))).map(String::from)
            },
        )
    }

    /// Returns the raw value of a numeric target.
    pub fn numeric_target(&self, target: NumericTarget) -> f64 {
        match target {
            NumericTarget::Accommodates => self.accommodates,
            NumericTarget::Bathrooms => self.bathrooms,
            NumericTarget::Bedrooms => self.bedrooms,
            NumericTarget::Beds => self.beds,
            NumericTarget::Price => self.price,
        }
    }

    /// Returns the value of a categorical target.
    pub fn categorical_target(&self, target: CategoricalTarget) -> Option<&str> {
        match target {
            CategoricalTarget::PropertyType => Some(&self.property_type),
            CategoricalTarget::RoomType => Some(&self.room_type),
            CategoricalTarget::BathroomsText => self.bathrooms_text.as_deref(),
        }
    }

    /// Rounds and clamps all values into their domain.
    /// If the own price is not positive, the first positive of `price_fallbacks` is used.
    pub fn finish(&self, price_fallbacks: impl IntoIterator<Item = f64>) -> ListingPrediction {
        ListingPrediction {
            property_type: self.property_type.clone(),
            room_type: self.room_type.clone(),
            bathrooms_text: self.bathrooms_text.clone(),
            accommodates: round_count(self.accommodates),
            bathrooms: round_bathrooms(self.bathrooms),
            bedrooms: round_count(self.bedrooms),
            beds: round_count(self.beds),
            price: resolve_price(once(self.price).chain(price_fallbacks)),
        }
    }
}

/// Rounds to the nearest integer, but at least [MIN_COUNT].
pub fn round_count(value: f64) -> u32 {
    if !value.is_finite() {
        return MIN_COUNT;
    }
    value.round().max(f64::from(MIN_COUNT)).min(f64::from(u32::MAX)) as u32
}

/// Rounds to the nearest multiple of 0.5, but at least [MIN_BATHROOMS].
pub fn round_bathrooms(value: f64) -> f64 {
    if !value.is_finite() {
        return MIN_BATHROOMS;
    }
    ((value * 2.0).round() / 2.0).max(MIN_BATHROOMS)
}

/// Picks the first positive, finite candidate and rounds it to two decimals.
/// Never returns less than [MIN_PRICE].
pub fn resolve_price(candidates: impl IntoIterator<Item = f64>) -> f64 {
    for candidate in candidates {
        if candidate.is_finite() && candidate > 0.0 {
            return round_price(candidate);
        }
        log::debug!("Discarding undefined price {}", candidate);
    }
    MIN_PRICE
}

/// From here on every f64 is a whole number, so there are no cents left to round.
const INTEGRAL_PRICE: f64 = 4_503_599_627_370_496.0;

fn round_price(value: f64) -> f64 {
    if value >= INTEGRAL_PRICE {
        return value;
    }
    ((value * 100.0).round() / 100.0).max(MIN_PRICE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use proptest::prelude::*;
    use test_helpers::create_new_listing;

    #[test]
    fn aggregation_from_cli_names() {
        assert_eq!("Median".parse::<Aggregation>(), Ok(Aggregation::Median));
        assert_eq!("mean".parse::<Aggregation>(), Ok(Aggregation::Mean));
        assert!("mode".parse::<Aggregation>().is_err());
    }

    #[test]
    fn bathrooms_round_to_nearest_half() {
        assert_approx_eq!(round_bathrooms(1.74), 1.5);
        assert_approx_eq!(round_bathrooms(1.76), 2.0);
        assert_approx_eq!(round_bathrooms(0.1), 0.5);
        assert_approx_eq!(round_bathrooms(f64::NAN), 0.5);
    }

    #[test]
    fn counts_are_at_least_one() {
        assert_eq!(round_count(0.2), 1);
        assert_eq!(round_count(2.5), 3);
        assert_eq!(round_count(-4.0), 1);
        assert_eq!(round_count(f64::NAN), 1);
    }

    #[test]
    fn price_falls_back_to_first_positive_candidate() {
        assert_approx_eq!(resolve_price(vec![f64::NAN, -3.0, 42.123, 7.0]), 42.12);
        assert_approx_eq!(resolve_price(vec![0.0]), MIN_PRICE);
        assert_approx_eq!(resolve_price(vec![0.001]), MIN_PRICE);
        assert_approx_eq!(resolve_price(Vec::new()), MIN_PRICE);
    }

    #[test]
    fn huge_prices_stay_finite() {
        assert_eq!(resolve_price(vec![f64::MAX]), f64::MAX);
        let price = resolve_price(vec![1.005e300]);
        assert!(price.is_finite());
        assert_eq!(price, price.round());
        assert_approx_eq!(resolve_price(vec![123_456_789.016]), 123_456_789.02, 1e-6);
    }

    #[test]
    fn mean_of_huge_prices_is_not_discarded() {
        let listings: Vec<Listing> = (0..2)
            .map(|_| {
                let mut listing = create_new_listing(1);
                listing.price = Some(f64::MAX);
                listing
            })
            .collect();
        let refs: Vec<&Listing> = listings.iter().collect();
        let aggregate = TargetAggregate::from_listings(&refs, Aggregation::Mean).unwrap();
        assert_eq!(aggregate.finish(None).price, f64::MAX);
    }

    #[test]
    fn median_aggregation() {
        let mut cheap = create_new_listing(1);
        cheap.price = Some(10.0);
        let mut expensive = create_new_listing(1);
        expensive.price = Some(1000.0);
        let medium = create_new_listing(1);
        let listings = vec![&cheap, &expensive, &medium];

        let median = TargetAggregate::from_listings(&listings, Aggregation::Median).unwrap();
        let mean = TargetAggregate::from_listings(&listings, Aggregation::Mean).unwrap();
        assert_approx_eq!(median.price, 100.0);
        assert_approx_eq!(mean.price, 370.0);
    }

    #[test]
    fn missing_required_target_gives_none() {
        let mut listing = create_new_listing(1);
        listing.room_type = None;
        assert!(TargetAggregate::from_listings(&[&listing], Aggregation::Mean).is_none());

        let mut listing = create_new_listing(1);
        listing.bathrooms_text = None;
        let aggregate = TargetAggregate::from_listings(&[&listing], Aggregation::Mean).unwrap();
        assert_eq!(aggregate.bathrooms_text, None);
    }

    proptest! {
        #[test]
        fn finished_values_are_in_domain(
            accommodates in -10.0..100.0f64,
            bathrooms in -10.0..20.0f64,
            price in -1e4..1e6f64,
            fallback in 0.0..1e6f64,
        ) {
            let aggregate = TargetAggregate {
                property_type: "Loft".into(),
                room_type: "Private room".into(),
                bathrooms_text: None,
                accommodates,
                bathrooms,
                bedrooms: accommodates / 2.0,
                beds: accommodates,
                price,
            };
            let prediction = aggregate.finish(once(fallback));

            prop_assert!(prediction.accommodates >= 1);
            prop_assert!(prediction.bedrooms >= 1);
            prop_assert!(prediction.beds >= 1);
            prop_assert!(prediction.bathrooms >= 0.5);
            prop_assert!((prediction.bathrooms * 2.0).fract() == 0.0);
            prop_assert!(prediction.price > 0.0);
            prop_assert!(((prediction.price * 100.0).round() - prediction.price * 100.0).abs() < 1e-6);
        }
    }
}
