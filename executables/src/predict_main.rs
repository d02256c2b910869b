#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
use common::{
    dataset::read_listings_from_csv, logging, util::path_or_relative_to_project_root, Listing,
    NcResult,
};
use evaluators::evaluate_predictions;
use executables::{
    append_to_prediction_log, load_model, model_path, DEFAULT_DATA_PATH,
    DEFAULT_PREDICTION_LOG_PATH,
};
use predictors::ModelKind;
use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(about = "Predicts the attributes of a new listing with a saved model.")]
struct Cli {
    #[structopt(short = "m", long, default_value = "base", help = "Options: base, advanced")]
    model: ModelKind,
    #[structopt(long = "model-path", parse(from_os_str))]
    model_path: Option<PathBuf>,
    #[structopt(long, help = "The host of the new listing")]
    host_id: Option<u64>,
    #[structopt(long)]
    name: Option<String>,
    #[structopt(long)]
    description: Option<String>,
    #[structopt(long)]
    neighbourhood: Option<String>,
    #[structopt(
        long,
        help = "Predict an existing listing of the data set and compare with its real values"
    )]
    listing_id: Option<u64>,
    #[structopt(short = "d", long = "data", parse(from_os_str))]
    data_path: Option<PathBuf>,
    #[structopt(long = "log", parse(from_os_str))]
    log_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct Output<'a> {
    provenance: common::Provenance,
    prediction: &'a common::ListingPrediction,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<BTreeMap<&'static str, evaluators::FieldComparison>>,
}

impl Cli {
    fn query(&self) -> NcResult<(Listing, Option<Listing>)> {
        if let Some(listing_id) = self.listing_id {
            let data_path =
                path_or_relative_to_project_root(self.data_path.as_ref(), DEFAULT_DATA_PATH)?;
            let actual = read_listings_from_csv(&data_path)?
                .into_iter()
                .find(|listing| listing.id == listing_id)
                .ok_or_else(|| format!("No listing with id {} in {:?}", listing_id, data_path))?;
            let mut query = actual.clone();
            query.clear_target_information();
            return Ok((query, Some(actual)));
        }

        let host_id = self
            .host_id
            .ok_or("Either --host-id or --listing-id is needed")?;
        let query = Listing {
            host_id,
            name: self.name.clone(),
            description: self.description.clone(),
            neighbourhood: self.neighbourhood.clone(),
            ..Listing::default()
        };
        Ok((query, None))
    }
}

fn main() -> NcResult<()> {
    logging::init_logging();

    let args = Cli::from_args();
    log::info!("CLI Arguments: {:?}", args);

    let model = load_model(args.model, model_path(args.model_path.as_ref(), args.model)?)?;
    let (mut query, actual) = args.query()?;

    let (prediction, provenance) = model.predict_listing(&query)?;
    prediction.apply_to(&mut query, provenance);

    let log_path =
        path_or_relative_to_project_root(args.log_path.as_ref(), DEFAULT_PREDICTION_LOG_PATH)?;
    append_to_prediction_log(&log_path, args.model, provenance, query.host_id, &prediction)?;
    log::info!("Appended prediction to {:?}", &log_path);

    let output = Output {
        provenance,
        prediction: &prediction,
        comparison: actual
            .as_ref()
            .map(|actual| evaluate_predictions(&query, actual)),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
