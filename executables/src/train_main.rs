#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
use common::{
    dataset::read_listings_from_csv, logging, util::path_or_relative_to_project_root, NcResult,
    Persistent, Trainable,
};
use executables::{model_path, DEFAULT_DATA_PATH};
use predictors::{advanced_model::DEFAULT_NEIGHBOURS, Aggregation, Model, ModelKind};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(about = "Trains a model on all listings and saves it.")]
struct Cli {
    #[structopt(short = "d", long = "data", parse(from_os_str))]
    data_path: Option<PathBuf>,
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output_path: Option<PathBuf>,
    #[structopt(short = "m", long, default_value = "base", help = "Options: base, advanced")]
    model: ModelKind,
    #[structopt(
        long,
        default_value = "mean",
        help = "How the base model combines numeric values. Options: mean, median"
    )]
    aggregation: Aggregation,
    #[structopt(long, help = "Neighbours consulted by the advanced model. Default: 10")]
    neighbours: Option<usize>,
}

fn main() -> NcResult<()> {
    logging::init_logging();

    let args = Cli::from_args();
    log::info!("CLI Arguments: {:?}", args);

    let data_path = path_or_relative_to_project_root(args.data_path.as_ref(), DEFAULT_DATA_PATH)?;
    log::info!("Loading data from {:?}...", data_path);
    let listings = read_listings_from_csv(&data_path)?;
    log::info!("Loading data...DONE\n\tn={}", listings.len());

    let mut model = Model::untrained(
        args.model,
        args.aggregation,
        args.neighbours.unwrap_or(DEFAULT_NEIGHBOURS),
    );

    log::info!("training {} model...", args.model);
    model.train(&listings)?;
    log::info!("training {} model... DONE", args.model);

    let output_path = model_path(args.output_path.as_ref(), args.model)?;
    model.save(&output_path)?;
    log::info!("Wrote model to {:?}", &output_path);

    Ok(())
}
