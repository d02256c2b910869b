use crate::{AdvancedModel, Aggregation, BaseModel, Model, ModelKind};
use common::{logging::init_test_logging, Listing, NumericTarget, Provenance, Trainable};
use evaluators::TargetEvaluator;
use predictions::{Driver, Predictor, SplitStrategy};
use proptest::prelude::*;
use std::iter::once;
use test_helpers::*;

/// Gives a listing with the given text and the targets of [create_new_listing].
fn constant_targets(mut listing: Listing) -> Listing {
    let template = create_new_listing(listing.host_id);
    listing.property_type = template.property_type;
    listing.room_type = template.room_type;
    listing.bathrooms_text = template.bathrooms_text;
    listing.accommodates = template.accommodates;
    listing.bathrooms = template.bathrooms;
    listing.bedrooms = template.bedrooms;
    listing.beds = template.beds;
    listing.price = template.price;
    listing
}

macro_rules! model_tests {
    ($mod : ident, $gen : expr) => {
        mod $mod {
            use super::*;

            #[test]
            fn err_when_untrained() {
                let model = $gen;
                let mut listing = create_new_listing(1);
                assert!(model.predict(once(&mut listing)).is_err());
            }

            #[test]
            fn err_without_training_data() {
                let mut model = $gen;
                assert!(model.train(&Vec::new()).is_err());
            }

            proptest! {
                #[test]
                fn constant_targets_yield_constant_prediction(
                    listings in prop::collection::vec(full_listing(), 1..64),
                    mut predict in full_listing(),
                ) {
                    let listings: Vec<_> = listings.into_iter().map(constant_targets).collect();
                    let expected = constant_targets(predict.clone());
                    predict.clear_target_information();

                    let mut model = $gen;
                    model.train(&listings).unwrap();
                    model.predict(once(&mut predict)).unwrap();

                    prop_assert!(predict.provenance.is_some());
                    for &target in NumericTarget::ALL.iter() {
                        prop_assert_eq!(predict.numeric_target(target), expected.numeric_target(target));
                    }
                    prop_assert_eq!(&predict.property_type, &expected.property_type);
                    prop_assert_eq!(&predict.room_type, &expected.room_type);
                    prop_assert_eq!(&predict.bathrooms_text, &expected.bathrooms_text);
                }

                #[test]
                fn every_prediction_is_complete(
                    listings in full_listings(128),
                    mut predict in prop::collection::vec(full_listing_of_hosts(64), 1..32),
                ) {
                    for listing in predict.iter_mut() {
                        listing.clear_target_information();
                    }

                    let mut model = $gen;
                    model.train(&listings).unwrap();
                    model.predict(predict.iter_mut()).unwrap();

                    for listing in &predict {
                        prop_assert!(listing.is_complete());
                        prop_assert!(listing.provenance.is_some());
                    }
                }
            }
        }
    };
}

model_tests!(base_model, BaseModel::new());
model_tests!(base_model_median, BaseModel::with_aggregation(Aggregation::Median));
model_tests!(advanced_model, AdvancedModel::new());
model_tests!(
    model_enum,
    Model::untrained(ModelKind::Advanced, Aggregation::Mean, 3)
);

fn hosts_with_several_listings() -> Vec<Listing> {
    let mut listings: Vec<_> = (0..400u64)
        .map(|id| {
            let mut listing = create_new_listing(id % 50);
            listing.id = id;
            listing.price = Some(50.0 + (id % 50) as f64);
            listing
        })
        .collect();
    common::listing::set_listing_idxs(listings.iter_mut());
    listings
}

#[test]
fn host_split_never_reaches_host_history() {
    init_test_logging();
    let listings = hosts_with_several_listings();
    let mut data: Vec<_> = listings.iter().collect();

    let mut model = BaseModel::new();
    let evaluator = TargetEvaluator::new();
    let mut driver = Driver::with(&mut model, &evaluator);
    driver.set_split_strategy(SplitStrategy::ByHost("hosts".into()));

    let metrics = driver.drive(&mut data).unwrap();
    assert_eq!(metrics.coverage, 0.0);
    assert!(metrics.count > 0);
}

#[test]
fn record_split_mostly_uses_host_history() {
    init_test_logging();
    let listings = hosts_with_several_listings();
    let mut data: Vec<_> = listings.iter().collect();

    let mut model = BaseModel::new();
    let evaluator = TargetEvaluator::new();
    let mut driver = Driver::with(&mut model, &evaluator);

    let metrics = driver.drive(&mut data).unwrap();
    assert!(metrics.coverage > 0.5);
    assert_eq!(metrics.mean_absolute_errors[&NumericTarget::Beds], 0.0);
}

#[test]
fn full_drive_predicts_every_host_from_its_history() {
    init_test_logging();
    let listings = hosts_with_several_listings();
    let data: Vec<_> = listings.iter().collect();

    let mut model = BaseModel::new();
    let evaluator = TargetEvaluator::new();
    let metrics = Driver::with(&mut model, &evaluator)
        .drive_full(&data)
        .unwrap();

    assert_eq!(metrics.coverage, 1.0);
    assert_eq!(metrics.count, listings.len());
    assert_eq!(metrics.mean_absolute_errors[&NumericTarget::Price], 0.0);
}

#[test]
fn model_enum_reports_host_provenance() {
    init_test_logging();
    let listings = hosts_with_several_listings();
    let mut model = Model::untrained(ModelKind::Base, Aggregation::Mean, 1);
    model.train(&listings).unwrap();

    let mut listing = create_new_listing(7);
    listing.clear_target_information();
    model.predict(once(&mut listing)).unwrap();

    assert_eq!(listing.provenance, Some(Provenance::Host));
    assert_eq!(listing.price, Some(57.0));
}
