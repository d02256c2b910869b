//! This module provides the [BaseModel], which predicts a listing from the history of its host.
use std::{collections::BTreeMap, iter::once};

use common::{
    Listing, ListingPrediction, NcError, NcResult, Persistent, Provenance, Trainable,
};
use predictions::Predictor;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{Aggregation, TargetAggregate},
    persistence,
};

/// Predicts all targets of a listing as the aggregate over the training listings of the same host.
/// Hosts without training listings get the aggregate over all training listings.
///
/// The trained state is replaced as a whole by [train](Trainable::train) and
/// [load](Persistent::load) and is read-only otherwise, so a trained model can be shared between
/// threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseModel {
    aggregation: Aggregation,
    state: Option<BaseModelState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BaseModelState {
    aggregation: Aggregation,
    hosts: BTreeMap<u64, TargetAggregate>,
    global: TargetAggregate,
}

impl BaseModelState {
    fn predict(&self, host_id: u64) -> (ListingPrediction, Provenance) {
        match self.hosts.get(&host_id) {
            Some(aggregate) => (aggregate.finish(once(self.global.price)), Provenance::Host),
            None => {
                log::debug!("Unknown host {}, using global defaults", host_id);
                (self.global.finish(None), Provenance::Global)
            }
        }
    }
}

impl BaseModel {
    /// The model kind stored in snapshots.
    pub const KIND: &'static str = "base";

    /// Creates an untrained model aggregating numeric targets by their mean.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an untrained model using the given [Aggregation] for numeric targets.
    pub fn with_aggregation(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            state: None,
        }
    }

    /// Gives the aggregation used for numeric targets.
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Has the model been trained or loaded?
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> NcResult<&BaseModelState> {
        self.state.as_ref().ok_or(NcError::NotFittedError)
    }

    /// Predicts all targets for a listing of `host_id` and tells where the prediction came from.
    /// # Example
    /// ```
    /// # use common::{ListingBuilder, Provenance, Trainable};
    /// # use predictors::BaseModel;
    /// let listing = ListingBuilder::default()
    ///     .host_id(1)
    ///     .property_type("Entire loft").room_type("Entire home/apt")
    ///     .accommodates(2).bedrooms(1).beds(1).bathrooms(1.0).price(80.0)
    ///     .build().unwrap();
    /// let mut model = BaseModel::new();
    /// model.train(vec![&listing]).unwrap();
    ///
    /// let (prediction, provenance) = model.predict_host(1).unwrap();
    /// assert_eq!(provenance, Provenance::Host);
    /// assert_eq!(prediction.price, 80.0);
    /// assert_eq!(model.predict_host(2).unwrap().1, Provenance::Global);
    /// ```
    pub fn predict_host(&self, host_id: u64) -> NcResult<(ListingPrediction, Provenance)> {
        Ok(self.state()?.predict(host_id))
    }

    /// Like [predict_host](BaseModel::predict_host), without the provenance.
    pub fn predict_host_values(&self, host_id: u64) -> NcResult<ListingPrediction> {
        self.predict_host(host_id).map(|(prediction, _)| prediction)
    }

    /// How many hosts have their own aggregate? Zero if untrained.
    pub fn host_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.hosts.len())
    }

    /// Has `host_id` training listings?
    pub fn knows_host(&self, host_id: u64) -> bool {
        self.state
            .as_ref()
            .map_or(false, |state| state.hosts.contains_key(&host_id))
    }

    /// The raw aggregate over all training listings, if trained.
    pub fn global_defaults(&self) -> Option<&TargetAggregate> {
        self.state.as_ref().map(|state| &state.global)
    }
}

impl Trainable for BaseModel {
    /// Replaces the complete state with aggregates over `training_data`.
    /// Incomplete listings are skipped.
    /// Fails if no complete listing is given, the model is left unchanged then.
    fn train<'i>(&mut self, training_data: impl IntoIterator<Item = &'i Listing>) -> NcResult<()> {
        let (complete, skipped): (Vec<&Listing>, Vec<&Listing>) = training_data
            .into_iter()
            .partition(|listing| listing.is_complete());
        if !skipped.is_empty() {
            log::warn!("Skipping {} incomplete training listings", skipped.len());
        }
        if complete.is_empty() {
            return Err("No complete listings provided".into());
        }

        let mut by_host: BTreeMap<u64, Vec<&Listing>> = BTreeMap::new();
        for &listing in complete.iter() {
            by_host.entry(listing.host_id).or_default().push(listing);
        }

        let hosts = by_host
            .into_iter()
            .map(|(host_id, listings)| {
                TargetAggregate::from_listings(&listings, self.aggregation)
                    .map(|aggregate| (host_id, aggregate))
            })
            .collect::<Option<BTreeMap<_, _>>>()
            .ok_or("Could not aggregate host listings")?;
        let global = TargetAggregate::from_listings(&complete, self.aggregation)
            .ok_or("Could not aggregate global defaults")?;

        log::info!(
            "Aggregated {} listings of {} hosts",
            complete.len(),
            hosts.len()
        );
        self.state = Some(BaseModelState {
            aggregation: self.aggregation,
            hosts,
            global,
        });
        Ok(())
    }
}

impl Predictor for BaseModel {
    /// Predicts every listing by its `host_id` and sets its provenance.
    fn predict<'j>(&self, validation_data: impl IntoIterator<Item = &'j mut Listing>) -> NcResult<()> {
        let state = self.state()?;
        for listing in validation_data {
            let (prediction, provenance) = state.predict(listing.host_id);
            prediction.apply_to(listing, provenance);
        }
        Ok(())
    }
}

impl Persistent for BaseModel {
    fn to_bytes(&self) -> NcResult<Vec<u8>> {
        persistence::encode(Self::KIND, self.state.as_ref())
    }

    fn restore_from_bytes(&mut self, bytes: &[u8]) -> NcResult<()> {
        let state: Option<BaseModelState> = persistence::decode(Self::KIND, bytes)?;
        if let Some(state) = &state {
            self.aggregation = state.aggregation;
        }
        self.state = state;
        Ok(())
    }
}
