#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]

//! This crate contains all our predictors.
pub use advanced_model::AdvancedModel;
pub use aggregate::{Aggregation, TargetAggregate};
pub use base_model::BaseModel;
pub use model::{Model, ModelKind};

pub mod advanced_model;
pub mod aggregate;
mod base_model;
mod model;
mod persistence;

#[cfg(test)]
mod tests;
