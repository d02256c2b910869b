#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]

//! This crate contains all our evaluators.

mod deviation_output;
pub use deviation_output::DeviationOutput;

mod comparison;
pub use comparison::{evaluate_predictions, FieldComparison};

pub mod target;
pub use target::{TargetEvaluator, TargetMetrics};

fn mean(iter: impl Iterator<Item = f64>) -> Option<f64> {
    let (count, sum) = iter.fold((0usize, 0.0), |(count, sum), value| (count + 1, sum + value));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
