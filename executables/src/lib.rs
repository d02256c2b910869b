#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
//! This crate contains helper functions that are used exclusively in defining binaries, that is
//! main functions.
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use common::{
    util::path_or_relative_to_project_root, ListingPrediction, NcResult, Persistent, Provenance,
};
use predictions::SplitStrategy;
use predictors::{advanced_model::DEFAULT_NEIGHBOURS, Aggregation, Model, ModelKind};
use serde::Deserialize;

/// Where the raw listings are read from unless told otherwise.
pub const DEFAULT_DATA_PATH: &str = "data/raw/listings.csv";
/// Where every served prediction is appended to unless told otherwise.
pub const DEFAULT_PREDICTION_LOG_PATH: &str = "logs/predictions.csv";

/// Gives the location of the model snapshot of the given kind, relative to the project root.
pub fn default_model_path(kind: ModelKind) -> String {
    format!("models/{}_model.msgpack", kind)
}

/// Resolves `path` or the snapshot location of `kind` in the project root.
pub fn model_path(path: Option<&PathBuf>, kind: ModelKind) -> NcResult<PathBuf> {
    path_or_relative_to_project_root(path, &default_model_path(kind))
}

/// Loads a previously saved model of the given kind.
pub fn load_model<P: AsRef<Path>>(kind: ModelKind, path: P) -> NcResult<Model> {
    let mut model = Model::untrained(kind, Aggregation::default(), DEFAULT_NEIGHBOURS);
    model.load(&path)?;
    log::info!("Loaded {} model from {:?}", kind, path.as_ref());
    Ok(model)
}

/// Must always match config/evaluate/types.dhall
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EvaluationConfig {
    /// Which model gets evaluated.
    pub model: ModelKind,
    /// How listings are split into training and test data.
    pub split: SplitStrategy,
    /// Only used by the base model.
    pub aggregation: Aggregation,
    /// Only used by the advanced model.
    pub neighbours: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Base,
            split: SplitStrategy::default(),
            aggregation: Aggregation::default(),
            neighbours: DEFAULT_NEIGHBOURS,
        }
    }
}

impl EvaluationConfig {
    /// Config from dhall file
    pub fn from_file<P: AsRef<Path>>(path: P) -> NcResult<Self> {
        Ok(serde_dhall::from_file(path).parse::<EvaluationConfig>()?)
    }

    /// An untrained model as described by this config.
    pub fn construct_model(&self) -> Model {
        Model::untrained(self.model, self.aggregation, self.neighbours)
    }
}

/// Writes one row describing a served prediction, without header.
/// The columns are timestamp, model, provenance, host id and then all targets.
pub fn write_prediction_row<W: Write>(
    writer: W,
    timestamp: &str,
    model: ModelKind,
    provenance: Provenance,
    host_id: u64,
    prediction: &ListingPrediction,
) -> NcResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(&[
        timestamp.to_string(),
        model.name().to_string(),
        provenance.as_str().to_string(),
        host_id.to_string(),
        prediction.property_type.clone(),
        prediction.room_type.clone(),
        prediction.bathrooms_text.clone().unwrap_or_default(),
        prediction.accommodates.to_string(),
        prediction.bathrooms.to_string(),
        prediction.bedrooms.to_string(),
        prediction.beds.to_string(),
        prediction.price.to_string(),
    ])?;
    csv_writer.flush()?;
    Ok(())
}

/// Appends a row for the served prediction to the log at `path`, stamped with the local time.
/// The file and its directory are created if needed.
pub fn append_to_prediction_log<P: AsRef<Path>>(
    path: P,
    model: ModelKind,
    provenance: Provenance,
    host_id: u64,
    prediction: &ListingPrediction,
) -> NcResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let timestamp = Local::now().format("%d/%m/%Y %H:%M:%S").to_string();
    write_prediction_row(file, &timestamp, model, provenance, host_id, prediction)
}
