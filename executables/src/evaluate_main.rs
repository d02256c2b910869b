#![cfg_attr(feature = "strict", deny(warnings))]
#![cfg_attr(feature = "strict", deny(clippy::all))]
use chrono::Utc;
use common::{
    dataset::read_listings_from_csv,
    logging,
    util::{path_or_relative_to_project_root, write_serializable_to_json},
    NcResult,
};
use evaluators::TargetEvaluator;
use executables::{EvaluationConfig, DEFAULT_DATA_PATH};
use predictions::{Driver, SplitStrategy};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(about = "Trains a model on part of the listings and evaluates it on the rest.")]
struct Cli {
    #[structopt(short = "d", long = "data", parse(from_os_str))]
    data_path: Option<PathBuf>,
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output_path: Option<PathBuf>,
    #[structopt(long = "config", parse(from_os_str))]
    config_path: Option<PathBuf>,
    #[structopt(
        long,
        help = "Split into training and test set by hashing the host id with this seed"
    )]
    split_by_host: Option<String>,
    #[structopt(long, help = "Train and evaluate on all listings. This leaks!")]
    full: bool,
    #[structopt(long)]
    limit: Option<usize>,
}

impl Cli {
    fn output_path(&self) -> NcResult<PathBuf> {
        path_or_relative_to_project_root(
            self.output_path.as_ref(),
            &format!("data/evaluation/{}.json", Utc::now().to_rfc3339()),
        )
    }

    fn read_config(&self) -> NcResult<EvaluationConfig> {
        let mut config = if let Some(path) = self.config_path.as_ref() {
            EvaluationConfig::from_file(path)?
        } else {
            EvaluationConfig::default()
        };
        if let Some(seed) = self.split_by_host.as_ref() {
            config.split = SplitStrategy::ByHost(seed.clone());
        }
        Ok(config)
    }
}

fn main() -> NcResult<()> {
    logging::init_logging();

    let args = Cli::from_args();
    log::info!("CLI Arguments: {:?}", args);
    let config = args.read_config()?;
    log::info!("Using config {:#?}", config);

    let data_path = path_or_relative_to_project_root(args.data_path.as_ref(), DEFAULT_DATA_PATH)?;
    log::info!("Loading data from {:?}...", data_path);
    let mut listings = read_listings_from_csv(&data_path)?;
    if let Some(limit) = args.limit {
        listings.truncate(limit);
    }
    log::info!("Loading data...DONE\n\tn={}", listings.len());

    let mut model = config.construct_model();
    let evaluator = TargetEvaluator::new();
    let mut driver = Driver::with(&mut model, &evaluator);
    driver.set_split_strategy(config.split.clone());

    let mut data: Vec<_> = listings.iter().collect();
    let output = if args.full {
        log::warn!("Evaluating on the training data, the results are overly optimistic.");
        driver.drive_full(&data)?
    } else {
        driver.drive(&mut data)?
    };
    log::info!("\n{}", output);

    let output_path = args.output_path()?;
    write_serializable_to_json(&output, &output_path)?;
    log::info!("Wrote evaluation to {:?}", &output_path);

    Ok(())
}
