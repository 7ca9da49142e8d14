//! `qfarm`: crop advisory from the command line
//!
//! Every subcommand covers one piece of the advisory, `advise` runs all of them on the same
//! readings.
mod config;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use qfarm_advisory::{
    roadmap, select_scheduler, Assessment, ClimateReadings, CropRecommender, FeatureVector, Goal,
    SchedulerKind,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::config::{load_config, QfarmConfig, ReadingsConfig};

/// Crop planned for when no recommendation is requested
const DEFAULT_CROP: &str = "Rice";

#[derive(Parser, Debug)]
#[command(
    name = "qfarm",
    version,
    about = "Crop recommendation, goal scoring, farming roadmaps and irrigation planning"
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed of every random draw, makes runs reproducible
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Number of trees in the forest
    #[arg(long, global = true)]
    trees: Option<usize>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recommend the crop best suited to soil and climate readings
    Recommend {
        #[command(flatten)]
        readings: ReadingArgs,

        /// Labelled csv to fit the forest on instead of the bundled table
        #[arg(long, value_name = "CSV")]
        dataset: Option<PathBuf>,

        /// Csv of readings with a header row, one recommendation per row
        #[arg(long, value_name = "CSV")]
        batch: Option<PathBuf>,

        /// Print the share of trees voting for every crop
        #[arg(long)]
        votes: bool,
    },
    /// Fit the forest on a labelled csv and report the hold-out accuracy
    Train {
        #[arg(long, value_name = "CSV")]
        dataset: Option<PathBuf>,

        /// Fraction of observations held out for testing
        #[arg(long, default_value_t = 0.2)]
        test_ratio: f32,
    },
    /// Score the growing conditions for a goal
    Score {
        #[arg(long, default_value = "maximize-yield")]
        goal: Goal,

        #[command(flatten)]
        climate: ClimateArgs,
    },
    /// Print the seven step farming roadmap of a crop
    Roadmap {
        #[arg(long, default_value = DEFAULT_CROP)]
        crop: String,

        #[command(flatten)]
        climate: ClimateArgs,
    },
    /// Plan the irrigation slots of a day
    Irrigate {
        /// auto, eigen-solver or fallback
        #[arg(long)]
        scheduler: Option<SchedulerKind>,
    },
    /// Run the full advisory: crop, score, roadmap and irrigation
    Advise {
        #[command(flatten)]
        readings: ReadingArgs,

        /// Recommend the crop instead of planning for the default one
        #[arg(long)]
        recommend: bool,

        #[arg(long, default_value = "maximize-yield")]
        goal: Goal,

        #[arg(long, value_name = "CSV")]
        dataset: Option<PathBuf>,

        #[arg(long)]
        scheduler: Option<SchedulerKind>,
    },
}

#[derive(Args, Debug, Default, Clone)]
struct ClimateArgs {
    /// Temperature in °C
    #[arg(long, allow_hyphen_values = true)]
    temperature: Option<f64>,

    /// Relative humidity in %
    #[arg(long)]
    humidity: Option<f64>,

    /// Soil pH
    #[arg(long)]
    ph: Option<f64>,
}

#[derive(Args, Debug, Default, Clone)]
struct ReadingArgs {
    /// Nitrogen content of the soil
    #[arg(long)]
    nitrogen: Option<f64>,

    /// Phosphorus content of the soil
    #[arg(long)]
    phosphorus: Option<f64>,

    /// Potassium content of the soil
    #[arg(long)]
    potassium: Option<f64>,

    #[command(flatten)]
    climate: ClimateArgs,

    /// Rainfall in mm, only used by models fit with a rainfall column
    #[arg(long)]
    rainfall: Option<f64>,
}

impl ClimateArgs {
    fn apply(&self, readings: &mut ReadingsConfig) {
        if let Some(temperature) = self.temperature {
            readings.temperature = temperature;
        }
        if let Some(humidity) = self.humidity {
            readings.humidity = humidity;
        }
        if let Some(ph) = self.ph {
            readings.ph = ph;
        }
    }
}

impl ReadingArgs {
    fn apply(&self, readings: &mut ReadingsConfig) {
        if let Some(nitrogen) = self.nitrogen {
            readings.nitrogen = nitrogen;
        }
        if let Some(phosphorus) = self.phosphorus {
            readings.phosphorus = phosphorus;
        }
        if let Some(potassium) = self.potassium {
            readings.potassium = potassium;
        }
        if self.rainfall.is_some() {
            readings.rainfall = self.rainfall;
        }
        self.climate.apply(readings);
    }
}

/// Command line flags win over the configuration file
fn apply_overrides(config: &mut QfarmConfig, cli: &Cli) {
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(trees) = cli.trees {
        config.forest.n_trees = trees;
    }

    match &cli.command {
        Command::Recommend {
            readings, dataset, ..
        }
        | Command::Advise {
            readings, dataset, ..
        } => {
            readings.apply(&mut config.readings);
            if dataset.is_some() {
                config.dataset = dataset.clone();
            }
        }
        Command::Train { dataset, .. } => {
            if dataset.is_some() {
                config.dataset = dataset.clone();
            }
        }
        Command::Score { climate, .. } | Command::Roadmap { climate, .. } => {
            climate.apply(&mut config.readings)
        }
        Command::Irrigate { .. } => {}
    }

    if let Command::Irrigate {
        scheduler: Some(kind),
    }
    | Command::Advise {
        scheduler: Some(kind),
        ..
    } = &cli.command
    {
        config.irrigation.scheduler = *kind;
    }
}

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            info!(seed, "using seeded generator");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Fit the recommender on the configured dataset, or on the bundled advisory table
fn build_recommender(config: &QfarmConfig) -> Result<CropRecommender> {
    let params = config.forest.params(config.seed)?;

    match &config.dataset {
        Some(path) => {
            let dataset = qfarm_datasets::load_labelled_csv_path(path)
                .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
            CropRecommender::fit(&dataset, &params).context("Failed to fit crop recommender")
        }
        None => CropRecommender::advisory(&params).context("Failed to fit crop recommender"),
    }
}

fn recommend(config: &QfarmConfig, batch: Option<&Path>, votes: bool) -> Result<()> {
    let recommender = build_recommender(config)?;

    if let Some(path) = batch {
        let (headers, readings) = qfarm_datasets::readings_from_csv_path(path)
            .with_context(|| format!("Failed to load readings: {}", path.display()))?;
        let crops = recommender.recommend_table(&headers, &readings)?;

        for (idx, crop) in crops.iter().enumerate() {
            println!("{}\t{}", idx + 1, crop);
        }
        return Ok(());
    }

    let readings = FeatureVector::from(&config.readings);
    println!("Recommended crop: {}", recommender.recommend(&readings)?);

    if votes {
        for (crop, share) in recommender.vote_shares(&readings)? {
            println!("  {:<16} {:.2}", crop, share);
        }
    }

    Ok(())
}

fn train(config: &QfarmConfig, test_ratio: f32, rng: &mut StdRng) -> Result<()> {
    let path = config
        .dataset
        .as_ref()
        .ok_or_else(|| anyhow!("No dataset given, pass --dataset or set `dataset` in the config"))?;
    let params = config.forest.params(config.seed)?;

    let report = CropRecommender::train_from_csv(path, test_ratio, &params, rng)
        .with_context(|| format!("Failed to train on {}", path.display()))?;

    println!(
        "Trained on {} samples, tested on {}",
        report.train_samples, report.test_samples
    );
    println!("Accuracy: {:.2}%", report.accuracy * 100.0);
    println!("Feature importance:");
    for (feature, importance) in report.recommender.feature_importance() {
        println!("  {:<12} {:.3}", feature, importance);
    }

    Ok(())
}

fn irrigate(kind: SchedulerKind, rng: &mut StdRng) -> Result<()> {
    let scheduler = select_scheduler(kind)?;
    let schedule = scheduler
        .schedule(rng)
        .with_context(|| format!("Scheduler {} failed", scheduler.name()))?;

    println!("Irrigation schedule ({}): {}", scheduler.name(), schedule);

    Ok(())
}

fn advise(config: &QfarmConfig, recommend: bool, goal: Goal, rng: &mut StdRng) -> Result<()> {
    let readings = FeatureVector::from(&config.readings);
    let climate = readings.climate();

    let recommender;
    let crop = if recommend {
        recommender = build_recommender(config)?;
        recommender.recommend(&readings)?
    } else {
        DEFAULT_CROP
    };
    println!("Crop: {}", crop);

    let assessment = Assessment::new(goal, &climate, rng);
    println!("{}", assessment);

    println!("\nRoadmap for {}:", crop);
    print!("{}", roadmap(crop, &climate));

    println!();
    irrigate(config.irrigation.scheduler, rng)
}

fn run(command: &Command, config: &QfarmConfig, rng: &mut StdRng) -> Result<()> {
    match command {
        Command::Recommend { batch, votes, .. } => recommend(config, batch.as_deref(), *votes),
        Command::Train { test_ratio, .. } => train(config, *test_ratio, rng),
        Command::Score { goal, .. } => {
            let climate = FeatureVector::from(&config.readings).climate();
            println!("{}", Assessment::new(*goal, &climate, rng));
            Ok(())
        }
        Command::Roadmap { crop, .. } => {
            let climate: ClimateReadings = FeatureVector::from(&config.readings).climate();
            print!("{}", roadmap(crop, &climate));
            Ok(())
        }
        Command::Irrigate { .. } => irrigate(config.irrigation.scheduler, rng),
        Command::Advise {
            recommend, goal, ..
        } => advise(config, *recommend, *goal, rng),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_cli_logging(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => QfarmConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    let mut rng = build_rng(config.seed);
    run(&cli.command, &config, &mut rng)
}
