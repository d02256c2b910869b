//! Choosing between our models at runtime.
use std::{fmt, str::FromStr};

use common::{Listing, ListingPrediction, NcResult, Persistent, Provenance, Trainable};
use predictions::Predictor;
use serde::{Deserialize, Serialize};

use crate::{AdvancedModel, Aggregation, BaseModel};

/// The kinds of models we ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// See [BaseModel].
    Base,
    /// See [AdvancedModel].
    Advanced,
}

impl ModelKind {
    /// The name used in file names, snapshots and logs.
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Base => BaseModel::KIND,
            ModelKind::Advanced => AdvancedModel::KIND,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "base" => Ok(ModelKind::Base),
            "advanced" => Ok(ModelKind::Advanced),
            other => Err(format!("Unknown model kind '{}', use base or advanced", other)),
        }
    }
}

/// One of our models. Forwards everything to the wrapped model.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Model {
    Base(BaseModel),
    Advanced(AdvancedModel),
}

impl Model {
    /// Creates an untrained model of the given kind.
    /// `aggregation` only affects the [BaseModel], `neighbours` only the [AdvancedModel].
    pub fn untrained(kind: ModelKind, aggregation: Aggregation, neighbours: usize) -> Self {
        match kind {
            ModelKind::Base => Model::Base(BaseModel::with_aggregation(aggregation)),
            ModelKind::Advanced => Model::Advanced(AdvancedModel::with_neighbours(neighbours)),
        }
    }

    /// Gives the kind of the wrapped model.
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Base(_) => ModelKind::Base,
            Model::Advanced(_) => ModelKind::Advanced,
        }
    }

    /// Predicts a single listing. The [BaseModel] only looks at the host id, the [AdvancedModel]
    /// only at the free-text fields.
    pub fn predict_listing(&self, listing: &Listing) -> NcResult<(ListingPrediction, Provenance)> {
        match self {
            Model::Base(model) => model.predict_host(listing.host_id),
            Model::Advanced(model) => model.predict_listing(listing),
        }
    }
}

impl Trainable for Model {
    fn train<'i>(&mut self, training_data: impl IntoIterator<Item = &'i Listing>) -> NcResult<()> {
        match self {
            Model::Base(model) => model.train(training_data),
            Model::Advanced(model) => model.train(training_data),
        }
    }
}

impl Predictor for Model {
    fn predict<'j>(&self, validation_data: impl IntoIterator<Item = &'j mut Listing>) -> NcResult<()> {
        match self {
            Model::Base(model) => model.predict(validation_data),
            Model::Advanced(model) => model.predict(validation_data),
        }
    }
}

impl Persistent for Model {
    fn to_bytes(&self) -> NcResult<Vec<u8>> {
        match self {
            Model::Base(model) => model.to_bytes(),
            Model::Advanced(model) => model.to_bytes(),
        }
    }

    fn restore_from_bytes(&mut self, bytes: &[u8]) -> NcResult<()> {
        match self {
            Model::Base(model) => model.restore_from_bytes(bytes),
            Model::Advanced(model) => model.restore_from_bytes(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_helpers::create_new_listing;

    #[test]
    fn kinds_parse_case_insensitive() {
        assert_eq!("Base".parse::<ModelKind>(), Ok(ModelKind::Base));
        assert_eq!("advanced".parse::<ModelKind>(), Ok(ModelKind::Advanced));
        assert!("forest".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::Advanced.to_string(), "advanced");
    }

    #[test]
    fn snapshots_only_load_into_same_kind() {
        let training = vec![create_new_listing(1), create_new_listing(2)];
        let mut base = Model::untrained(ModelKind::Base, Aggregation::Mean, 10);
        base.train(&training).unwrap();
        let bytes = base.to_bytes().unwrap();

        let mut advanced = Model::untrained(ModelKind::Advanced, Aggregation::Mean, 10);
        assert!(advanced.restore_from_bytes(&bytes).unwrap_err().is_corrupt_model());

        let mut restored = Model::untrained(ModelKind::Base, Aggregation::Median, 10);
        restored.restore_from_bytes(&bytes).unwrap();
        assert_eq!(restored, base);
        assert_eq!(
            restored.predict_listing(&training[0]).unwrap().1,
            Provenance::Host
        );
    }
}
