//! Random forest classifier
//!
//! An ensemble of decision trees, each grown on a bootstrap sample of the observations and a
//! random subset of the features.
use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
use rand::{rngs::StdRng, seq::index::sample, Rng, SeedableRng};

use qfarm::{
    dataset::{AsTargets, Labels},
    error::{Error, Result},
    traits::*,
    Dataset, DatasetBase, Float, Label, ParamGuard,
};

use super::RandomForestValidParams;
use crate::DecisionTree;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A fitted random forest for classification.
///
/// Every tree predicts a class and the forest returns the class with the most votes. Ties are
/// broken in favour of the class seen first in the training targets. Trees are grown on class
/// indices, `classes()` maps those indices back to labels.
///
/// ### Example
///
/// ```rust
/// use qfarm_trees::RandomForestClassifier;
/// use qfarm::prelude::*;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let (train, valid) = qfarm_datasets::crop_recommendation()
///     .shuffle(&mut rng)
///     .split_with_ratio(0.8);
///
/// let forest = RandomForestClassifier::params().seed(42).fit(&train).unwrap();
/// let accuracy = forest.predict(&valid).confusion_matrix(&valid).unwrap().accuracy();
///
/// assert!(accuracy > 0.8);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone)]
pub struct RandomForestClassifier<F: Float, L: Label> {
    trees: Vec<DecisionTree<F, usize>>,
    feature_indices: Vec<Vec<usize>>,
    classes: Vec<L>,
    num_features: usize,
}

impl<F: Float, L: Label> RandomForestClassifier<F, L> {
    /// Number of fitted trees
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// The fitted trees, together with the indices of the features each one was grown on
    pub fn trees(&self) -> impl Iterator<Item = (&DecisionTree<F, usize>, &[usize])> {
        self.trees
            .iter()
            .zip(self.feature_indices.iter().map(|x| x.as_slice()))
    }

    /// Class labels in order of first appearance in the training targets
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Number of features the forest was fit on
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Fraction of trees voting for every class
    ///
    /// Returns a matrix with one row per observation and one column per entry of `classes()`.
    pub fn vote_shares<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array2<f32> {
        let mut votes = Array2::zeros((x.nrows(), self.classes.len()));

        for (tree, features) in self.trees() {
            let sub_x = x.select(Axis(1), features);
            let prediction: Array1<usize> = tree.predict(&sub_x);
            for (row, class) in prediction.iter().enumerate() {
                votes[(row, *class)] += 1.0;
            }
        }

        votes / self.trees.len() as f32
    }

    /// Mean feature importance over all trees, indexed by the features of the training data
    pub fn feature_importance(&self) -> Vec<F> {
        let mut importance = vec![F::zero(); self.num_features];

        for (tree, features) in self.trees() {
            for (local, value) in tree.feature_importance().into_iter().enumerate() {
                let idx = features[local];
                importance[idx] = importance[idx] + value;
            }
        }

        let sum: F = importance.iter().cloned().sum();
        if sum <= F::zero() {
            return importance;
        }

        importance.into_iter().map(|x| x / sum).collect()
    }
}

/// Index of the column with the most votes, the first column wins ties
fn majority(votes: ndarray::ArrayView1<f32>) -> usize {
    votes
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_idx, best), (idx, count)| {
            if *count > best {
                (idx, *count)
            } else {
                (best_idx, best)
            }
        })
        .0
}

impl<F: Float, L: Label + Default, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<L>>
    for RandomForestClassifier<F, L>
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let votes = self.vote_shares(x);
        for (row, target) in votes.rows().into_iter().zip(y.iter_mut()) {
            *target = self.classes[majority(row)].clone();
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

impl<F: Float, L: Label, D, T> Fit<ArrayBase<D, Ix2>, T, Error> for RandomForestValidParams<F, L>
where
    D: Data<Elem = F>,
    T: AsTargets<Elem = L>,
{
    type Object = RandomForestClassifier<F, L>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let nsamples = x.nrows();
        let nfeatures = x.ncols();
        if nsamples == 0 {
            return Err(Error::NotEnoughSamples);
        }

        let targets = dataset.targets().as_targets();
        if targets.len() != nsamples {
            return Err(Error::MismatchedShapes {
                expected: nsamples,
                found: targets.len(),
            });
        }

        let classes = dataset.targets().labels();
        let lookup = classes
            .iter()
            .enumerate()
            .map(|(idx, label)| (label, idx))
            .collect::<HashMap<_, _>>();
        let class_of = targets
            .iter()
            .map(|label| lookup[label])
            .collect::<Array1<usize>>();
        let weights = (0..nsamples)
            .map(|i| dataset.weight_for(i))
            .collect::<Array1<f32>>();
        let feature_names = dataset.feature_names();

        let mut rng = match self.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let samples_per_tree = self.max_samples().unwrap_or(nsamples);
        let features_per_tree = self.max_features().resolve(nfeatures);

        let mut trees = Vec::with_capacity(self.n_trees());
        let mut feature_indices = Vec::with_capacity(self.n_trees());
        for _ in 0..self.n_trees() {
            let rows = if self.bootstrap() {
                (0..samples_per_tree)
                    .map(|_| rng.gen_range(0..nsamples))
                    .collect::<Vec<_>>()
            } else {
                sample(&mut rng, nsamples, samples_per_tree.min(nsamples)).into_vec()
            };

            let mut features = sample(&mut rng, nfeatures, features_per_tree).into_vec();
            features.sort_unstable();

            let records = x.select(Axis(0), &rows).select(Axis(1), &features);
            let subset = Dataset::new(records, class_of.select(Axis(0), &rows))
                .with_weights(weights.select(Axis(0), &rows))
                .with_feature_names(
                    features
                        .iter()
                        .map(|idx| feature_names[*idx].clone())
                        .collect(),
                );

            trees.push(self.tree_params().check_ref()?.fit(&subset)?);
            feature_indices.push(features);
        }

        Ok(RandomForestClassifier {
            trees,
            feature_indices,
            classes,
            num_features: nfeatures,
        })
    }
}
