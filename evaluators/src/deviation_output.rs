use serde::Serialize;

use super::mean;

/// A struct which accumulates many deviations.
/// It provides access to the average, minimum, maximum and some configurable number of percentiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationOutput {
    mean: f64,
    min_deviation: f64,
    max_deviation: f64,
    percentiles: Vec<f64>,
}

impl DeviationOutput {
    /// Accumulates the given deviations, ignoring all NaN values.
    /// Like [with_percentiles](DeviationOutput::with_percentiles) with `num_percentiles`=3.
    /// This will compute 25-th, 50-th and 75-th percentile.
    pub fn new(deviation_iter: impl Iterator<Item = f64>) -> Option<Self> {
        Self::with_percentiles(deviation_iter, 3)
    }

    /// Accumulate the given deviations, ignoring all NaN values.
    /// This will compute the minimum, maximum and average over deviations and `num_percentiles` many percentiles.
    ///
    /// # Return value
    /// If `deviation_iter` produces nothing but NaN values, this function returns None.
    pub fn with_percentiles(
        deviation_iter: impl Iterator<Item = f64>,
        num_percentiles: usize,
    ) -> Option<Self> {
        let mut deviations: Vec<_> = deviation_iter.filter(|f| !f.is_nan()).collect();
        deviations.sort_unstable_by(|a, b| a.partial_cmp(b).expect("we have no NaNs"));
        let min_deviation = *deviations.first()?;
        let max_deviation = *deviations.last()?;

        let percentiles: Vec<_> = (1..=num_percentiles)
            .map(|percentile| deviations[percentile * deviations.len() / (num_percentiles + 1)])
            .collect();

        Some(Self {
            mean: mean(deviations.iter().copied())?,
            min_deviation,
            max_deviation,
            percentiles,
        })
    }

    /// Gives the average deviation of the given data
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// The smallest deviation.
    pub fn min(&self) -> f64 {
        self.min_deviation
    }

    /// The largest deviation.
    pub fn max(&self) -> f64 {
        self.max_deviation
    }

    /// The percentiles in ascending order.
    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percentiles_for_fixed_values() {
        let deviations = vec![1.0, 6.0, 3.0, 2.0, 4.0, 0.0, 5.0];

        let deviation_output = DeviationOutput::new(deviations.iter().copied()).unwrap();

        assert_eq!(deviation_output.percentiles(), &[1.0, 3.0, 5.0]);
        assert_eq!(deviation_output.min(), 0.0);
        assert_eq!(deviation_output.max(), 6.0);
        assert_eq!(deviation_output.mean(), 3.0);
    }

    #[test]
    fn nothing_but_nan_gives_none() {
        assert!(DeviationOutput::new(vec![f64::NAN].into_iter()).is_none());
        assert!(DeviationOutput::new(Vec::new().into_iter()).is_none());
    }

    proptest! {
        #[test]
        fn deviation_output_chooses_median_with_1_percentile(
            mut deviations in prop::collection::vec(0.01..1e4f64, 1..128)
        ) {
            let deviation_output = DeviationOutput::with_percentiles(deviations.iter().copied(), 1).unwrap();

            deviations.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());

            let median = deviations[deviations.len() / 2];
            prop_assert!((deviation_output.percentiles[0] - median).abs() / median < f64::EPSILON);
        }
    }
}
