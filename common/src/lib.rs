#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]

//! This crate contains everything which might be needed across different tasks inside our project.

mod error;

pub use error::{NcError, NcResult};

pub mod listing;
pub use listing::{
    target_column_names, CategoricalTarget, Listing, ListingBuilder, ListingPrediction,
    NumericTarget, Provenance,
};

mod traits;
pub use traits::*;

pub mod dataset;

pub mod logging;
pub mod util;
