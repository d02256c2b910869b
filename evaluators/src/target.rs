//! This module contains the evaluator comparing all targets at once.
//! It should be your default choice of evaluator.
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
};

use common::{CategoricalTarget, Listing, NcResult, NumericTarget, Provenance};
use predictions::Evaluator;
use serde::Serialize;

use crate::{mean, DeviationOutput};

/// The quality of a set of predictions, over all targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetMetrics {
    /// How many pairs were evaluated.
    pub count: usize,
    /// Mean absolute error per numeric target. A target is missing if no pair had it set on both
    /// sides.
    pub mean_absolute_errors: BTreeMap<NumericTarget, f64>,
    /// Fraction of exact matches per categorical target. A target is missing if no pair had it
    /// set on both sides.
    pub accuracies: BTreeMap<CategoricalTarget, f64>,
    /// Fraction of distinct hosts which got at least one prediction from their own history.
    pub coverage: f64,
    /// Distribution of the absolute price errors.
    pub price_deviation: Option<DeviationOutput>,
}

fn significant(num: f64) -> f64 {
    if num == 0.0 || !num.is_finite() {
        return num;
    }
    let log10 = num.abs().log10().floor();
    let fac = 10f64.powf(-log10) * 100.0;
    (num * fac).round() / fac
}

impl Display for TargetMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== Evaluation of {} listings ==========", self.count)?;
        writeln!(f, "Host coverage: {}", significant(self.coverage))?;
        writeln!(f)?;

        writeln!(f, "Mean absolute error")?;
        for (target, error) in &self.mean_absolute_errors {
            writeln!(f, "  {}: {}", target.name(), significant(*error))?;
        }
        writeln!(f)?;

        writeln!(f, "Accuracy")?;
        for (target, accuracy) in &self.accuracies {
            writeln!(f, "  {}: {}", target.name(), significant(*accuracy))?;
        }

        if let Some(deviation) = &self.price_deviation {
            writeln!(f)?;
            write!(f, "Price deviation percentiles:")?;
            for percentile in deviation.percentiles() {
                write!(f, " {}", significant(*percentile))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "================================================")?;

        Ok(())
    }
}

/// An Evaluator computing [TargetMetrics].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TargetEvaluator {}

impl TargetEvaluator {
    /// Creates a new TargetEvaluator
    pub fn new() -> Self {
        Self {}
    }
}

impl Evaluator for TargetEvaluator {
    type Output = TargetMetrics;

    /// Fails if no pairs are given.
    fn evaluate<'i>(
        &self,
        pairs: impl IntoIterator<Item = (&'i Listing, &'i Listing)>,
    ) -> NcResult<Self::Output> {
        let pairs: Vec<_> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Err("No listings were provided".into());
        }
        let pairs = pairs.as_slice();
        log::debug!("Evaluating {} pairs", pairs.len());

        let absolute_errors = move |target: NumericTarget| {
            pairs.iter().filter_map(move |(real, predicted)| {
                Some((real.numeric_target(target)? - predicted.numeric_target(target)?).abs())
            })
        };

        let mean_absolute_errors = NumericTarget::ALL
            .iter()
            .filter_map(|&target| mean(absolute_errors(target)).map(|error| (target, error)))
            .collect();

        let accuracies = CategoricalTarget::ALL
            .iter()
            .filter_map(|&target| {
                let matches = pairs.iter().filter_map(|(real, predicted)| {
                    let real = real.categorical_target(target)?;
                    let predicted = predicted.categorical_target(target)?;
                    Some(if real == predicted { 1.0 } else { 0.0 })
                });
                mean(matches).map(|accuracy| (target, accuracy))
            })
            .collect();

        let hosts: BTreeSet<u64> = pairs.iter().map(|(real, _)| real.host_id).collect();
        let covered_hosts: BTreeSet<u64> = pairs
            .iter()
            .filter(|(_, predicted)| predicted.provenance == Some(Provenance::Host))
            .map(|(real, _)| real.host_id)
            .collect();

        Ok(TargetMetrics {
            count: pairs.len(),
            mean_absolute_errors,
            accuracies,
            coverage: covered_hosts.len() as f64 / hosts.len() as f64,
            price_deviation: DeviationOutput::new(absolute_errors(NumericTarget::Price)),
        })
    }
}
