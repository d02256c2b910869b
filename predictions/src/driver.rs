// should partition data to training and test data
// initiate the training and evaluate the training on test data
// should be ease to modify the underlying algorithm for training
// evaluation should be equal for all approaches
use std::collections::HashSet;

use common::{Listing, NcError, NcResult};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use crate::{Evaluator, Predictor};

const RNG_SEED: [u8; 16] = *b"0123456789abcdef";
/// The share of listings used for training.
pub const TRAINING_RATIO: f64 = 0.8;

/// Determines how listings are assigned to the training and the test partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// Shuffle all listings with a fixed seed and cut after 80%.
    /// A host may end up in both partitions.
    ByRecord,
    /// Hash every host id together with the given seed.
    /// All listings of a host end up in the same partition.
    ByHost(String),
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::ByRecord
    }
}

/// This function will perturb the given slice into two parts.
///
/// # Returns
/// The first returned slice contains about 80% randomly selected elements in a random order from the original slice.
/// The second slice contains all the remaining elemnts, *without* a guaratee about there order.
fn split_data_randomly<T>(data: &mut [T]) -> (&mut [T], &mut [T]) {
    let mut rng = XorShiftRng::from_seed(RNG_SEED);
    let training_amount = (TRAINING_RATIO * (data.len() as f64)) as usize;
    data.partial_shuffle(&mut rng, training_amount)
}

/// Perturb the given slice into two parts by host.
/// A host belongs to the first part if its [deterministic_host_index](Listing::deterministic_host_index)
/// is below `ratio` of the index range. So the first part holds about `ratio` of all *hosts*,
/// not necessarily of all listings.
/// # Returns
/// - two sub-slices such that no host id occurs in both.
pub fn split_by_host<'i, 'j>(
    data: &'j mut [&'i Listing],
    ratio: f64,
    seed: &str,
) -> (&'j mut [&'i Listing], &'j mut [&'i Listing]) {
    let threshold = ratio * 256.0;
    let is_training =
        |listing: &Listing| f64::from(listing.deterministic_host_index(seed)) < threshold;

    data.sort_by_key(|listing| (!is_training(*listing), listing.host_id, listing.id));
    let split_index = data
        .iter()
        .take_while(|listing| is_training(**listing))
        .count();

    data.split_at_mut(split_index)
}

/// This struct can be used to compose a predictor and a evaluator.
/// The main function on this struct is [drive](Driver::drive),
/// which will evaluate a predictor on a given dataset.
pub struct Driver<'p, 'e, P: Predictor, E: Evaluator> {
    predictor: &'p mut P,
    evaluator: &'e E,
    split_strategy: SplitStrategy,
}

impl<'p, 'e, P: Predictor, E: Evaluator> Driver<'p, 'e, P, E> {
    /// This creates a new Driver from the given `predictor` and `evaluator`.
    /// Listings are split [ByRecord](SplitStrategy::ByRecord) unless changed.
    pub fn with(predictor: &'p mut P, evaluator: &'e E) -> Self {
        Self {
            predictor,
            evaluator,
            split_strategy: SplitStrategy::default(),
        }
    }

    /// Set the [SplitStrategy] used by all **future** calls to [drive](Driver::drive).
    pub fn set_split_strategy(&mut self, split_strategy: SplitStrategy) {
        self.split_strategy = split_strategy;
    }

    fn split_data<'i, 'j>(
        &self,
        data: &'j mut [&'i Listing],
    ) -> (&'j mut [&'i Listing], &'j mut [&'i Listing]) {
        match &self.split_strategy {
            SplitStrategy::ByRecord => split_data_randomly(data),
            SplitStrategy::ByHost(seed) => split_by_host(data, TRAINING_RATIO, seed),
        }
    }

    fn drive_inner(
        &mut self,
        training_data: Vec<Listing>,
        validation_data: Vec<Listing>,
    ) -> NcResult<E::Output> {
        let mut to_predict: Vec<Listing> = validation_data.clone();
        for listing in to_predict.iter_mut() {
            listing.clear_target_information();
        }

        let training_hosts: HashSet<u64> = training_data.iter().map(|l| l.host_id).collect();
        let test_hosts: HashSet<u64> = validation_data.iter().map(|l| l.host_id).collect();
        log::info!(
            "{} of {} test hosts also occur in the training data",
            test_hosts.intersection(&training_hosts).count(),
            test_hosts.len()
        );

        log::info!("training (n={})...", training_data.len());
        self.predictor
            .train(&training_data)
            .map_err(NcError::rethrow_with("Training failed"))?;
        log::info!("training... DONE");

        log::info!("predicting (n={})...", to_predict.len());
        self.predictor
            .predict(to_predict.iter_mut())
            .map_err(NcError::rethrow_with("Prediction failed"))?;
        log::info!("predicting... DONE");

        log::info!("evaluating...");
        let res = self
            .evaluator
            .evaluate(validation_data.iter().zip(to_predict.iter()))
            .map_err(NcError::rethrow_with("Evaluation failed"));
        log::info!("evaluating... DONE");
        res
    }

    /// This function splits the `data` in training data and validation data according to the
    /// [SplitStrategy].
    /// The predictor is then trained on the training set only.
    /// Then the predictor will be asked to predict each listing in the validation dataset.
    /// It will get a listing without targets (see [Listing::clear_target_information]).
    /// The pairs of the real listing and predicted listing will then be provided to the evaluator,
    /// which in turn gives how "good" the prediction was.
    ///
    /// The shuffling and splitting will be done inplace.
    ///
    /// This function does not attempt to prevent any errors or panics in the underlying predictor and evaluator.
    /// **It is the callers responsibility to ensure that they don't error out.**
    ///
    /// To split the data a fixed seed is used to ensure determinability.
    ///
    /// This function can be called multiple times. The predictor is trained from scratch on every
    /// call, so it must not keep state from previous calls.
    pub fn drive(&mut self, data: &mut [&Listing]) -> NcResult<E::Output> {
        let (training_data, validation_data) = self.split_data(data);
        let training_data: Vec<Listing> = training_data.iter().map(|&l| l.clone()).collect();
        let validation_data: Vec<Listing> = validation_data.iter().map(|&l| l.clone()).collect();
        log::info!("Preparing data...DONE");

        self.drive_inner(training_data, validation_data)
    }

    /// Like [drive](Driver::drive), but all data will be used for training *as well as* validation.
    /// This does allow cheating, but might be what you want.
    pub fn drive_full(&mut self, data: &[&Listing]) -> NcResult<E::Output> {
        let mut training_data: Vec<_> = data.iter().map(|&listing| listing.clone()).collect();
        let mut validation_data = training_data.clone();

        let mut rng = XorShiftRng::from_seed(RNG_SEED);
        training_data.shuffle(&mut rng);
        validation_data.shuffle(&mut rng);
        log::info!("Preparing data...DONE");

        self.drive_inner(training_data, validation_data)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use common::Trainable;
    use test_helpers::*;

    use crate::{Evaluator, Predictor};

    #[derive(Debug, Clone)]
    struct TestPredictor {
        training_size: Option<usize>,
        test_size: Cell<usize>,
        called_clear_target_information: Cell<bool>,
        called_training_before_prediction: Cell<bool>,
    }

    impl TestPredictor {
        fn new() -> Self {
            TestPredictor {
                training_size: None,
                test_size: Cell::new(0),
                called_clear_target_information: Cell::new(true),
                called_training_before_prediction: Cell::new(true),
            }
        }
    }

    impl Trainable for TestPredictor {
        fn train<'i>(&mut self, training_data: impl IntoIterator<Item = &'i Listing>) -> NcResult<()> {
            self.training_size = Some(training_data.into_iter().count());
            Ok(())
        }
    }

    impl Predictor for TestPredictor {
        fn predict<'i>(
            &self,
            validation_data: impl IntoIterator<Item = &'i mut Listing>,
        ) -> NcResult<()> {
            for datum in validation_data {
                self.test_size.set(self.test_size.get() + 1);

                let mut clone = datum.clone();
                clone.clear_target_information();
                if clone != *datum {
                    self.called_clear_target_information.set(false);
                }

                if self.training_size.is_none() {
                    self.called_training_before_prediction.set(false);
                    return Err("Training was not called before predict".into());
                }
            }

            Ok(())
        }
    }

    #[derive(Debug, Clone)]
    struct TestEvaluator;

    impl Evaluator for TestEvaluator {
        type Output = (usize, bool);

        fn evaluate<'i>(
            &self,
            pairs: impl IntoIterator<Item = (&'i Listing, &'i Listing)>,
        ) -> NcResult<Self::Output> {
            let vec_pairs: Vec<_> = pairs.into_iter().collect();
            Ok((
                vec_pairs.len(),
                vec_pairs
                    .iter()
                    .all(|(real, predicted)| real.id == predicted.id && real.idx == predicted.idx),
            ))
        }
    }

    #[test]
    fn split_strategy_reads_from_dhall() {
        let strategy: SplitStrategy = serde_dhall::from_str("< ByRecord | ByHost : Text >.ByHost \"abc\"")
            .parse()
            .unwrap();
        assert_eq!(strategy, SplitStrategy::ByHost("abc".into()));
    }

    proptest! {
        #[test]
        fn test_size_is_evaluation_size(listings in full_listings(128)) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            let (eval_size, _) = driver.drive_inner(listings.clone(), listings).unwrap();
            prop_assert_eq!(eval_size, driver.predictor.test_size.get());
        }

        #[test]
        fn object_ids_match(listings in full_listings(128)) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            let (_, object_ids_match) = driver.drive_inner(listings.clone(), listings).unwrap();

            prop_assert!(object_ids_match);
        }

        #[test]
        fn predictor_gets_no_targets(listings in full_listings(128)) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            let _ = driver.drive_inner(listings.clone(), listings);

            prop_assert!(driver.predictor.called_clear_target_information.get());
        }

        #[test]
        fn called_train_before_predict(listings in full_listings(128)) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            let _ = driver.drive_inner(listings.clone(), listings);

            prop_assert!(driver.predictor.called_training_before_prediction.get());
        }

        #[test]
        fn drive_splits_data(listings in prop::collection::vec(full_listing(), 5..128)) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            driver.drive(&mut *listings.iter().collect::<Vec<_>>()).unwrap();

            prop_assert!(driver.predictor.training_size.unwrap() < listings.len());
            prop_assert!(driver.predictor.test_size.get() < listings.len());
        }

        #[test]
        fn drive_uses_all_data(listings in full_listings(128), by_host in proptest::bool::ANY) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            if by_host {
                driver.set_split_strategy(SplitStrategy::ByHost("seed".into()));
            }
            driver.drive(&mut *listings.iter().collect::<Vec<_>>()).unwrap();

            prop_assert!(driver.predictor.training_size.unwrap() + driver.predictor.test_size.get() == listings.len());
        }

        #[test]
        fn drive_full_gives_all_data_to_training(listings in full_listings(128)) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            driver.drive_full(&*listings.iter().collect::<Vec<_>>()).unwrap();

            prop_assert!(driver.predictor.training_size.unwrap() == listings.len());
        }

        #[test]
        fn drive_full_gives_all_data_to_evaluation(listings in full_listings(128)) {
            let mut predictor = TestPredictor::new();
            let mut driver = Driver::with(&mut predictor, &TestEvaluator);
            let (eval_size, _) = driver.drive_full(&listings.iter().collect::<Vec<_>>()).unwrap();

            prop_assert!(eval_size == listings.len());
            prop_assert!(driver.predictor.test_size.get() == listings.len());
        }

        #[test]
        fn split_data_randomly_retains_all_data(mut data in prop::collection::vec(prop::num::usize::ANY, 0.. 256)) {
            data.sort_unstable();
            let copy = data.clone();
            let (training, validation) = split_data_randomly(data.as_mut_slice());

            let mut all_data : Vec<_> = training.iter().chain(validation.iter()).copied().collect();
            all_data.sort_unstable();
            prop_assert_eq!(copy, all_data);
        }

        #[test]
        fn split_data_ratio_matches(mut data in prop::collection::vec(prop::num::usize::ANY, 0.. 256)) {
            let (training, validation) = split_data_randomly(data.as_mut_slice());
            let all = training.len() + validation.len();

            prop_assert!(training.len() as f64 - 1.0 < (all as f64) * TRAINING_RATIO);
            prop_assert!(training.len() as f64 + 1.0 > (all as f64) * TRAINING_RATIO);
        }

        #[test]
        fn split_by_host_separates_hosts(data in prop::collection::vec(full_listing(), 0..256), seed in "[a-z]{1,8}") {
            let start_len = data.len();
            let mut refs: Vec<&Listing> = data.iter().collect();
            let (training, validation) = split_by_host(refs.as_mut_slice(), TRAINING_RATIO, &seed);

            prop_assert_eq!(start_len, training.len() + validation.len());

            let training_hosts: HashSet<u64> = training.iter().map(|l| l.host_id).collect();
            prop_assert!(validation.iter().all(|l| !training_hosts.contains(&l.host_id)));
        }
    }
}
