#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
#![cfg_attr(feature = "strict", deny(missing_docs))]

//! This crate contains all generic algorithms for our project.

pub mod aggregation;

mod category_codes;
pub use category_codes::CategoryCodes;

pub mod text;
