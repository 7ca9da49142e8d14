//! Crop recommendation with a random forest
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use qfarm::prelude::*;
use qfarm_trees::{RandomForestClassifier, RandomForestParams};
use rand::Rng;
use tracing::info;

use crate::error::{AdvisoryError, Result};
use crate::features::{FeatureSchema, FeatureVector};

/// Recommends the crop best suited to a set of readings
///
/// The recommender owns a fitted forest together with the crop names of the dataset it was fit
/// on, and only accepts readings of the same [`FeatureSchema`].
///
/// ```
/// use qfarm_advisory::{CropRecommender, FeatureVector};
/// use qfarm_trees::RandomForestClassifier;
///
/// let params = RandomForestClassifier::params().seed(42);
/// let recommender = CropRecommender::fit(&qfarm_datasets::advisory(), &params).unwrap();
///
/// let crop = recommender.recommend(&FeatureVector::default()).unwrap();
/// assert!(["Rice", "Wheat", "Maize", "Cotton", "Barley"].contains(&crop));
/// ```
#[derive(Debug, Clone)]
pub struct CropRecommender {
    forest: RandomForestClassifier<f64, usize>,
    crops: Vec<String>,
    feature_names: Vec<String>,
    schema: FeatureSchema,
}

/// Outcome of fitting a recommender on a train/test split
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub recommender: CropRecommender,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Fraction of test observations classified correctly
    pub accuracy: f32,
}

impl CropRecommender {
    /// Fit a forest on a labelled dataset
    ///
    /// Targets are class indices into the dataset's target names. A dataset without target
    /// names gets `crop-{i}` names.
    pub fn fit(
        dataset: &Dataset<f64, usize>,
        params: &RandomForestParams<f64, usize>,
    ) -> Result<Self> {
        let feature_names = dataset.feature_names();
        let schema = FeatureSchema::from_feature_names(feature_names.as_slice());

        let forest = params.check_ref()?.fit(dataset)?;

        let mut crops = dataset.target_names().to_vec();
        let nclasses = forest.classes().iter().max().map(|c| c + 1).unwrap_or(0);
        if crops.len() < nclasses {
            crops = (0..nclasses).map(|i| format!("crop-{}", i)).collect();
        }

        info!(
            trees = forest.num_trees(),
            samples = dataset.nsamples(),
            crops = crops.len(),
            %schema,
            "fitted crop recommender"
        );

        Ok(CropRecommender {
            forest,
            crops,
            feature_names,
            schema,
        })
    }

    /// Fit on the bundled six-row advisory table
    pub fn advisory(params: &RandomForestParams<f64, usize>) -> Result<Self> {
        Self::fit(&qfarm_datasets::advisory(), params)
    }

    /// Load a labelled csv file, fit on a shuffled split and measure accuracy on the rest
    ///
    /// `test_ratio` is the fraction of observations held out, `0.2` keeps the usual 80/20
    /// split.
    pub fn train_from_csv<P: AsRef<Path>, R: Rng + ?Sized>(
        path: P,
        test_ratio: f32,
        params: &RandomForestParams<f64, usize>,
        rng: &mut R,
    ) -> Result<TrainingReport> {
        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            return Err(AdvisoryError::TestRatio(test_ratio));
        }

        let path = path.as_ref();
        let dataset = qfarm_datasets::load_labelled_csv_path(path)?;
        info!(path = %path.display(), samples = dataset.nsamples(), "loaded crop dataset");

        let (train, test) = dataset.shuffle(rng).split_with_ratio(1.0 - test_ratio);
        if train.nsamples() == 0 || test.nsamples() == 0 {
            return Err(qfarm::Error::NotEnoughSamples.into());
        }

        let recommender = Self::fit(&train, params)?;
        let accuracy = recommender
            .forest
            .predict(test.records())
            .confusion_matrix(&test)?
            .accuracy();
        info!(accuracy, test_samples = test.nsamples(), "evaluated crop recommender");

        Ok(TrainingReport {
            recommender,
            train_samples: train.nsamples(),
            test_samples: test.nsamples(),
            accuracy,
        })
    }

    /// The most likely crop for `features`
    pub fn recommend(&self, features: &FeatureVector) -> Result<&str> {
        let row = self.row(features)?;
        let prediction: Array1<usize> = self.forest.predict(&row);

        Ok(&self.crops[prediction[0]])
    }

    /// Share of trees voting for every crop, highest share first
    pub fn vote_shares(&self, features: &FeatureVector) -> Result<Vec<(&str, f32)>> {
        let row = self.row(features)?;
        let shares = self.forest.vote_shares(&row);

        let mut votes = self
            .forest
            .classes()
            .iter()
            .zip(shares.row(0).iter())
            .map(|(class, share)| (self.crops[*class].as_str(), *share))
            .collect::<Vec<_>>();
        votes.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(votes)
    }

    /// Recommend a crop for every row of a readings table
    ///
    /// Columns are matched to the model features by name, ignoring case. Columns the model was
    /// not fit on are skipped.
    pub fn recommend_table(&self, headers: &[String], readings: &Array2<f64>) -> Result<Vec<&str>> {
        let columns = self
            .feature_names
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|header| header.eq_ignore_ascii_case(name))
                    .ok_or_else(|| AdvisoryError::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let records = readings.select(Axis(1), &columns);
        let prediction: Array1<usize> = self.forest.predict(&records);

        Ok(prediction
            .iter()
            .map(|class| self.crops[*class].as_str())
            .collect())
    }

    fn row(&self, features: &FeatureVector) -> Result<Array2<f64>> {
        Ok(features.to_row(&self.schema)?.insert_axis(Axis(0)))
    }

    /// Crop names, indexed by class
    pub fn crops(&self) -> &[String] {
        &self.crops
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Relative importance of every feature, in feature order
    pub fn feature_importance(&self) -> Vec<(&str, f64)> {
        self.feature_names
            .iter()
            .map(|name| name.as_str())
            .zip(self.forest.feature_importance())
            .collect()
    }

    pub fn forest(&self) -> &RandomForestClassifier<f64, usize> {
        &self.forest
    }
}
