//! This module provides the [AdvancedModel], which predicts listings of unknown hosts from their
//! free-text fields.
use std::iter::once;

use algorithms::{
    aggregation::{calculate_weighted_average, calculate_weighted_vote},
    text::{cosine_dissimilarity, SparseVector, TfIdfVectorizer},
    CategoryCodes,
};
use common::{
    CategoricalTarget, Listing, ListingPrediction, NcError, NcResult, NumericTarget, Persistent,
    Provenance, Trainable,
};
use predictions::Predictor;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{Aggregation, TargetAggregate},
    persistence,
};

/// How many neighbours are asked by default.
pub const DEFAULT_NEIGHBOURS: usize = 10;

/// How many tokens are kept for name, description and neighbourhood.
const FIELD_FEATURES: [usize; 3] = [100, 200, 50];

/// Predicts all targets of a listing from the training listings with the most similar texts.
///
/// Name, description and neighbourhood are each mapped to a TF-IDF vector, the concatenation is
/// the representation of a listing. The `neighbours` training listings with the smallest cosine
/// dissimilarity vote on the categorical targets and average the numeric ones, each weighted by
/// the inverse dissimilarity.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedModel {
    neighbours: usize,
    state: Option<AdvancedModelState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TrainingPoint {
    features: SparseVector,
    numeric: Vec<Option<f64>>,
    categories: Vec<Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AdvancedModelState {
    neighbours: usize,
    vectorizers: Vec<TfIdfVectorizer>,
    category_codes: Vec<CategoryCodes>,
    points: Vec<TrainingPoint>,
    global: TargetAggregate,
}

impl AdvancedModelState {
    fn features(&self, listing: &Listing) -> SparseVector {
        let mut offset = 0;
        let mut features = SparseVector::default();
        for (vectorizer, text) in self.vectorizers.iter().zip(listing.text_fields().iter()) {
            features = features.concat(&vectorizer.transform(text), offset);
            offset += vectorizer.width();
        }
        features
    }

    fn predict(&self, listing: &Listing) -> (ListingPrediction, Provenance) {
        let features = self.features(listing);

        let mut neighbours: Vec<(&TrainingPoint, f64)> = self
            .points
            .iter()
            .map(|point| (point, cosine_dissimilarity(&features, &point.features)))
            .filter(|(_, dissimilarity)| dissimilarity.is_finite())
            .collect();

        if neighbours.is_empty() {
            log::debug!("Listing {} shares no token, using global defaults", listing.id);
            return (self.global.finish(None), Provenance::Global);
        }

        // stable, so equally similar listings keep their training order
        neighbours.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbours.truncate(self.neighbours);

        let weight = |&(_, dissimilarity): &(&TrainingPoint, f64)| {
            1.0 / dissimilarity.max(1e-9).min(1e10)
        };

        let aggregate = TargetAggregate::try_from_fn(
            |target| {
                let position = numeric_position(target);
                let known: Vec<(f64, f64)> = neighbours
                    .iter()
                    .filter_map(|neighbour| {
                        neighbour.0.numeric[position].map(|value| (value, weight(neighbour)))
                    })
                    .collect();
                calculate_weighted_average(known, |(value, _)| *value, |(_, weight)| *weight)
                    .or_else(|| Some(self.global.numeric_target(target)))
            },
            |target| {
                let position = categorical_position(target);
                calculate_weighted_vote(
                    neighbours.iter(),
                    |neighbour| neighbour.0.categories[position],
                    |neighbour| weight(*neighbour),
                )
                .and_then(|code| self.category_codes[position].decode(code))
                .or_else(|| self.global.categorical_target(target))
                .map(String::from)
            },
        )
        .unwrap_or_else(|| self.global.clone());

        (
            aggregate.finish(once(self.global.price)),
            Provenance::Features,
        )
    }

    /// Rebuilds the lookups which are not stored and checks the state for consistency.
    fn rebuilt(mut self) -> NcResult<Self> {
        if self.vectorizers.len() != FIELD_FEATURES.len()
            || self.category_codes.len() != CategoricalTarget::ALL.len()
        {
            return Err(NcError::CorruptModelError(
                "wrong number of vectorizers or category tables".to_string(),
            ));
        }
        for vectorizer in self.vectorizers.iter_mut() {
            vectorizer.rebuild_index();
        }
        self.category_codes = self
            .category_codes
            .into_iter()
            .map(CategoryCodes::rebuilt)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| NcError::CorruptModelError("category table is malformed".to_string()))?;

        let consistent = self.points.iter().all(|point| {
            point.numeric.len() == NumericTarget::ALL.len()
                && point.categories.len() == CategoricalTarget::ALL.len()
                && point
                    .categories
                    .iter()
                    .zip(self.category_codes.iter())
                    .all(|(code, codes)| code.map_or(true, |code| codes.decode(code).is_some()))
        });
        if !consistent {
            return Err(NcError::CorruptModelError(
                "training point does not match the category tables".to_string(),
            ));
        }
        Ok(self)
    }
}

fn numeric_position(target: NumericTarget) -> usize {
    NumericTarget::ALL
        .iter()
        .position(|&other| other == target)
        .unwrap_or_default()
}

fn categorical_position(target: CategoricalTarget) -> usize {
    CategoricalTarget::ALL
        .iter()
        .position(|&other| other == target)
        .unwrap_or_default()
}

impl Default for AdvancedModel {
    fn default() -> Self {
        Self::with_neighbours(DEFAULT_NEIGHBOURS)
    }
}

impl AdvancedModel {
    /// The model kind stored in snapshots.
    pub const KIND: &'static str = "advanced";

    /// Creates an untrained model asking [DEFAULT_NEIGHBOURS] neighbours.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an untrained model asking `neighbours` neighbours, at least one.
    pub fn with_neighbours(neighbours: usize) -> Self {
        Self {
            neighbours: neighbours.max(1),
            state: None,
        }
    }

    /// Gives the number of neighbours asked per prediction.
    pub fn neighbours(&self) -> usize {
        self.neighbours
    }

    /// Has the model been trained or loaded?
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> NcResult<&AdvancedModelState> {
        self.state.as_ref().ok_or(NcError::NotFittedError)
    }

    /// Predicts all targets of a single listing from its free-text fields.
    /// The provenance is [Provenance::Features], or [Provenance::Global] if no training listing
    /// shares a token with it.
    pub fn predict_listing(&self, listing: &Listing) -> NcResult<(ListingPrediction, Provenance)> {
        Ok(self.state()?.predict(listing))
    }
}

impl Trainable for AdvancedModel {
    /// Learns the vocabularies and category tables from the complete listings of `training_data`
    /// and keeps their representations. Fails if no complete listing is given.
    fn train<'i>(&mut self, training_data: impl IntoIterator<Item = &'i Listing>) -> NcResult<()> {
        let (complete, skipped): (Vec<&Listing>, Vec<&Listing>) = training_data
            .into_iter()
            .partition(|listing| listing.is_complete());
        if !skipped.is_empty() {
            log::warn!("Skipping {} incomplete training listings", skipped.len());
        }
        let global = TargetAggregate::from_listings(&complete, Aggregation::Mean)
            .ok_or("No complete listings provided")?;

        let vectorizers: Vec<TfIdfVectorizer> = FIELD_FEATURES
            .iter()
            .enumerate()
            .map(|(field, &max_features)| {
                let mut vectorizer = TfIdfVectorizer::new(max_features);
                vectorizer.fit(complete.iter().map(|listing| listing.text_fields()[field]));
                vectorizer
            })
            .collect();

        let category_codes: Vec<CategoryCodes> = CategoricalTarget::ALL
            .iter()
            .map(|&target| {
                CategoryCodes::fit(
                    complete
                        .iter()
                        .filter_map(|listing| listing.categorical_target(target)),
                )
            })
            .collect();

        let mut state = AdvancedModelState {
            neighbours: self.neighbours,
            vectorizers,
            category_codes,
            points: Vec::new(),
            global,
        };
        let points: Vec<TrainingPoint> = complete
            .par_iter()
            .map(|listing| TrainingPoint {
                features: state.features(listing),
                numeric: NumericTarget::ALL
                    .iter()
                    .map(|&target| listing.numeric_target(target))
                    .collect(),
                categories: CategoricalTarget::ALL
                    .iter()
                    .zip(state.category_codes.iter())
                    .map(|(&target, codes)| {
                        listing
                            .categorical_target(target)
                            .and_then(|label| codes.encode(label))
                    })
                    .collect(),
            })
            .collect();
        state.points = points;

        log::info!(
            "Represented {} listings by {} text features",
            state.points.len(),
            state.vectorizers.iter().map(TfIdfVectorizer::width).sum::<u32>()
        );
        self.state = Some(state);
        Ok(())
    }
}

impl Predictor for AdvancedModel {
    /// Predicts every listing from its free-text fields, in parallel.
    fn predict<'j>(&self, validation_data: impl IntoIterator<Item = &'j mut Listing>) -> NcResult<()> {
        let state = self.state()?;
        let mut collected_data: Vec<&mut Listing> = validation_data.into_iter().collect();
        collected_data.par_iter_mut().for_each(|listing| {
            let (prediction, provenance) = state.predict(listing);
            prediction.apply_to(listing, provenance);
        });
        Ok(())
    }
}

impl Persistent for AdvancedModel {
    fn to_bytes(&self) -> NcResult<Vec<u8>> {
        persistence::encode(Self::KIND, self.state.as_ref())
    }

    fn restore_from_bytes(&mut self, bytes: &[u8]) -> NcResult<()> {
        let state: Option<AdvancedModelState> = persistence::decode(Self::KIND, bytes)?;
        let state = state.map(AdvancedModelState::rebuilt).transpose()?;
        if let Some(state) = &state {
            self.neighbours = state.neighbours;
        }
        self.state = state;
        Ok(())
    }
}
