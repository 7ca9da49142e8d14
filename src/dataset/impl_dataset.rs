use super::{AsTargets, Dataset, DatasetBase, Label, Labels, Records};
use ndarray::{Array1, Axis};
use rand::{seq::SliceRandom, Rng};
use std::collections::HashMap;

/// Implementation without constraints on records and targets
///
/// This implementation block provides methods for the creation and mutation of datasets. This
/// includes swapping the targets, return the records etc.
impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    ///
    /// # Example
    ///
    /// ```ignore
    /// let dataset = Dataset::new(records, targets);
    /// ```
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            weights: Array1::zeros(0),
            feature_names: Vec::new(),
            target_names: Vec::new(),
        }
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns reference to records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Returns optionally weights
    pub fn weights(&self) -> Option<&[f32]> {
        if !self.weights.is_empty() {
            Some(self.weights.as_slice().unwrap())
        } else {
            None
        }
    }

    /// Return a single weight
    ///
    /// The weight of the `idx`th observation is returned. If no weight is specified, then all
    /// observations are unweighted with default value `1.0`.
    pub fn weight_for(&self, idx: usize) -> f32 {
        self.weights.get(idx).copied().unwrap_or(1.0)
    }

    /// Updates the weights of a dataset
    pub fn with_weights(mut self, weights: Array1<f32>) -> DatasetBase<R, T> {
        self.weights = weights;

        self
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// This allow the reader to understand its purpose while analysing results, for example
    /// correlation analysis or feature importance.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Updates the feature names of a dataset
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        let feature_names = names.into_iter().map(|x| x.into()).collect();

        self.feature_names = feature_names;

        self
    }

    /// Returns the names of the classes, indexed by class
    ///
    /// The list is empty if the targets are not associated with a vocabulary.
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Updates the target names of a dataset
    pub fn with_target_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        self.target_names = names.into_iter().map(|x| x.into()).collect();

        self
    }

    /// Number of observations in the dataset
    pub fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    /// Number of features of every observation
    pub fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }
}

impl<L: Label, R: Records, T: AsTargets<Elem = L>> DatasetBase<R, T> {
    /// Calculates label frequencies from a dataset while masking certain samples.
    ///
    /// ### Parameters
    ///
    /// * `mask`: a boolean array that specifies which samples to include in the count
    ///
    /// ### Returns
    ///
    /// A mapping of the Dataset's samples to their frequencies
    pub fn label_frequencies_with_mask(&self, mask: &[bool]) -> HashMap<L, f32> {
        let mut freqs = HashMap::new();

        for (i, elm) in self
            .targets
            .as_targets()
            .iter()
            .enumerate()
            .filter(|(i, _)| mask[*i])
        {
            *freqs.entry(elm.clone()).or_insert(0.0) += self.weight_for(i);
        }

        freqs
    }

    /// Calculates label frequencies from a dataset
    pub fn label_frequencies(&self) -> HashMap<L, f32> {
        self.label_frequencies_with_mask(&vec![true; self.nsamples()])
    }

    /// Distinct labels in the targets, in order of first appearance
    pub fn labels(&self) -> Vec<L> {
        self.targets.labels()
    }
}

impl<F: Clone, L: Clone> Dataset<F, L> {
    /// Select a subset of observations by index
    ///
    /// Indices may repeat, in which case the observation is duplicated. Weights, feature names
    /// and target names are carried over.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset<F, L> {
        let weights = if self.weights.is_empty() {
            Array1::zeros(0)
        } else {
            self.weights.select(Axis(0), indices)
        };

        DatasetBase {
            records: self.records.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
            weights,
            feature_names: self.feature_names.clone(),
            target_names: self.target_names.clone(),
        }
    }

    /// Select a subset of features by index, keeping their names
    pub fn select_features(&self, features: &[usize]) -> Dataset<F, L> {
        let names = self.feature_names();

        DatasetBase {
            records: self.records.select(Axis(1), features),
            targets: self.targets.clone(),
            weights: self.weights.clone(),
            feature_names: features.iter().map(|idx| names[*idx].clone()).collect(),
            target_names: self.target_names.clone(),
        }
    }

    /// Apply bootstrapping for samples
    ///
    /// Draws `nsamples` observations with replacement.
    pub fn bootstrap_samples<G: Rng + ?Sized>(&self, nsamples: usize, rng: &mut G) -> Dataset<F, L> {
        let indices = (0..nsamples)
            .map(|_| rng.gen_range(0..self.nsamples()))
            .collect::<Vec<_>>();

        self.select_rows(&indices)
    }

    /// Shuffle the observations
    ///
    /// Every record keeps its target, only the order of observations changes.
    pub fn shuffle<G: Rng + ?Sized>(self, rng: &mut G) -> Dataset<F, L> {
        let mut indices = (0..self.nsamples()).collect::<Vec<_>>();
        indices.shuffle(rng);

        self.select_rows(&indices)
    }

    /// Split dataset into two disjoint chunks
    ///
    /// This function splits the observations in a dataset into two disjoint chunks. The splitting
    /// threshold is calculated with the `ratio`. For example a ratio of `0.8` leaves 80% of the
    /// observations in the first chunk and 20% in the second. This is used to split a dataset
    /// into a training and validation set.
    pub fn split_with_ratio(self, ratio: f32) -> (Dataset<F, L>, Dataset<F, L>) {
        let n = (self.nsamples() as f32 * ratio).ceil() as usize;
        let n = n.min(self.nsamples());

        let first = (0..n).collect::<Vec<_>>();
        let second = (n..self.nsamples()).collect::<Vec<_>>();

        (self.select_rows(&first), self.select_rows(&second))
    }

    /// Map targets with a function `f`
    pub fn map_targets<S, G: FnMut(&L) -> S>(self, fnc: G) -> Dataset<F, S> {
        let DatasetBase {
            records,
            targets,
            weights,
            feature_names,
            target_names,
        } = self;

        DatasetBase {
            records,
            targets: targets.map(fnc),
            weights,
            feature_names,
            target_names,
        }
    }
}
