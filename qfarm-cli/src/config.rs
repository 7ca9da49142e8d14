//! TOML configuration of the `qfarm` tool
//!
//! Every section is optional, missing values fall back to the defaults below. Command line
//! flags override the file.
//!
//! ```toml
//! seed = 42
//! dataset = "crops.csv"
//!
//! [forest]
//! n_trees = 100
//! max_depth = 12
//! max_features = "sqrt"
//! split_quality = "gini"
//! bootstrap = true
//!
//! [irrigation]
//! scheduler = "auto"
//!
//! [readings]
//! temperature = 25.0
//! humidity = 60.0
//! ph = 6.5
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qfarm_advisory::{FeatureVector, SchedulerKind};
use qfarm_trees::{MaxFeatures, RandomForestClassifier, RandomForestParams, SplitQuality};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QfarmConfig {
    /// Seed of every random draw, drawn from the operating system if missing
    pub seed: Option<u64>,
    /// Labelled csv the recommender is fit on instead of the bundled advisory table
    pub dataset: Option<PathBuf>,
    pub forest: ForestConfig,
    pub irrigation: IrrigationConfig,
    pub readings: ReadingsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    /// `sqrt`, `log2`, `all`, a fraction or a count
    pub max_features: String,
    /// `gini` or `entropy`
    pub split_quality: String,
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_trees: 100,
            max_depth: None,
            max_features: "sqrt".to_string(),
            split_quality: "gini".to_string(),
            bootstrap: true,
        }
    }
}

impl ForestConfig {
    /// Forest hyperparameters, seeded with `seed` when given
    pub fn params(&self, seed: Option<u64>) -> Result<RandomForestParams<f64, usize>> {
        let max_features = self
            .max_features
            .parse::<MaxFeatures>()
            .context("Invalid forest.max_features")?;
        let split_quality = self
            .split_quality
            .parse::<SplitQuality>()
            .context("Invalid forest.split_quality")?;

        let params = RandomForestClassifier::params()
            .n_trees(self.n_trees)
            .max_depth(self.max_depth)
            .max_features(max_features)
            .split_quality(split_quality)
            .bootstrap(self.bootstrap);

        Ok(match seed {
            Some(seed) => params.seed(seed),
            None => params,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrigationConfig {
    pub scheduler: SchedulerKind,
}

/// Readings used when no flag overrides them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingsConfig {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: Option<f64>,
}

impl Default for ReadingsConfig {
    fn default() -> Self {
        FeatureVector::default().into()
    }
}

impl From<FeatureVector> for ReadingsConfig {
    fn from(v: FeatureVector) -> Self {
        ReadingsConfig {
            nitrogen: v.nitrogen,
            phosphorus: v.phosphorus,
            potassium: v.potassium,
            temperature: v.temperature,
            humidity: v.humidity,
            ph: v.ph,
            rainfall: v.rainfall,
        }
    }
}

impl From<&ReadingsConfig> for FeatureVector {
    fn from(r: &ReadingsConfig) -> Self {
        FeatureVector {
            nitrogen: r.nitrogen,
            phosphorus: r.phosphorus,
            potassium: r.potassium,
            temperature: r.temperature,
            humidity: r.humidity,
            ph: r.ph,
            rainfall: r.rainfall,
        }
    }
}

pub fn load_config(path: &Path) -> Result<QfarmConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: QfarmConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qfarm::ParamGuard;

    #[test]
    fn empty_file_gives_defaults() {
        let config: QfarmConfig = toml::from_str("").unwrap();

        assert_eq!(config, QfarmConfig::default());
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.irrigation.scheduler, SchedulerKind::Auto);
        assert_eq!(FeatureVector::from(&config.readings), FeatureVector::default());
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let config: QfarmConfig = toml::from_str(
            r#"
            seed = 7

            [forest]
            n_trees = 25
            max_features = "0.5"
            split_quality = "entropy"

            [irrigation]
            scheduler = "eigen-solver"

            [readings]
            temperature = 33.5
            rainfall = 180.0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.forest.n_trees, 25);
        assert!(config.forest.bootstrap);
        assert_eq!(config.irrigation.scheduler, SchedulerKind::EigenSolver);
        assert_eq!(config.readings.temperature, 33.5);
        assert_eq!(config.readings.humidity, 60.0);
        assert_eq!(config.readings.rainfall, Some(180.0));

        let params = config.forest.params(config.seed).unwrap();
        assert_eq!(params.clone().check_unwrap().n_trees(), 25);
        let params = params.check_unwrap();
        assert_eq!(params.max_features(), MaxFeatures::Fraction(0.5));
        assert_eq!(
            params.tree_params().check_ref().unwrap().split_quality(),
            SplitQuality::Entropy
        );
    }

    #[test]
    fn invalid_max_features_is_reported() {
        let forest = ForestConfig {
            max_features: "many".to_string(),
            ..ForestConfig::default()
        };

        assert!(forest.params(None).is_err());

        let forest = ForestConfig {
            split_quality: "variance".to_string(),
            ..ForestConfig::default()
        };
        assert!(forest.params(None).is_err());
    }

    #[test]
    fn unknown_scheduler_fails_to_parse() {
        let result = toml::from_str::<QfarmConfig>("[irrigation]\nscheduler = \"qaoa\"\n");
        assert!(result.is_err());
    }
}
