//! Datasets
//!
//! This module implements the dataset struct and various helper traits to extend its
//! functionality.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Data, Ix2, ScalarOperand};

use num_traits::{FromPrimitive, NumCast};
use rand::distributions::uniform::SampleUniform;

use std::fmt;
use std::hash::Hash;
use std::iter::Sum;

mod impl_dataset;
mod impl_targets;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the records of a
/// dataset, i.e. the soil and climate readings.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + SampleUniform
    + ScalarOperand
    + approx::AbsDiffEq
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Discrete labels
///
/// Labels are countable, comparable and hashable. Currently boolean (binary task),
/// usize and strings (multi-label tasks) are supported.
pub trait Label: PartialEq + Eq + Hash + Clone + fmt::Debug {}

impl Label for bool {}
impl Label for usize {}
impl Label for String {}

/// DatasetBase
///
/// This is the fundamental structure of a dataset. It contains a number of records about the data
/// and may contain targets, weights, feature names and target names. In order to keep the type
/// complexity low the dataset base is only generic over the records and targets.
///
/// # Fields
///
/// * `records`: a two-dimensional matrix with dimensionality (nsamples, nfeatures)
/// * `targets`: a one-dimensional array with a class index for every sample
/// * `weights`: optional weights for each sample with dimensionality (nsamples)
/// * `feature_names`: optional descriptive feature names with dimensionality (nfeatures)
/// * `target_names`: optional names of the classes, indexed by class
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBase<R, T>
where
    R: Records,
{
    pub records: R,
    pub targets: T,

    pub weights: Array1<f32>,
    feature_names: Vec<String>,
    target_names: Vec<String>,
}

/// Dataset
///
/// The most commonly used typed of dataset. It contains a number of records
/// stored as an `Array2` and each record corresponds to a single target stored
/// in an `Array1`.
pub type Dataset<F, L> = DatasetBase<Array2<F>, Array1<L>>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

impl<F, S: Data<Elem = F>> Records for ArrayBase<S, Ix2> {
    type Elem = F;

    fn nsamples(&self) -> usize {
        self.nrows()
    }

    fn nfeatures(&self) -> usize {
        self.ncols()
    }
}

/// Return a reference to single targets
pub trait AsTargets {
    type Elem;

    fn as_targets(&self) -> ArrayView1<Self::Elem>;
}

/// Targets with discrete labels
///
/// Every target whose elements are labels can enumerate the set of distinct labels it contains.
pub trait Labels {
    type Elem: Label;

    /// Distinct labels, in order of first appearance
    fn labels(&self) -> Vec<Self::Elem>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn dataset_implements_required_methods() {
        let records = array![[1., 2.], [3., 4.], [5., 6.], [7., 8.]];
        let targets = array![0usize, 1, 0, 2];
        let dataset = Dataset::new(records, targets);

        assert_eq!(dataset.nsamples(), 4);
        assert_eq!(dataset.nfeatures(), 2);
        assert_eq!(dataset.feature_names(), vec!["feature-0", "feature-1"]);
        assert_eq!(dataset.labels(), vec![0, 1, 2]);
        assert_abs_diff_eq!(dataset.weight_for(3), 1.0);
    }

    #[test]
    fn datasets_compare_and_clone() {
        let dataset = Dataset::new(array![[1., 2.]], array![0usize]).with_feature_names(vec!["n", "p"]);
        let copy = dataset.clone();

        assert_eq!(copy, dataset);
        assert!(format!("{:?}", copy).contains("feature_names"));
        assert_ne!(copy.with_target_names(vec!["rice"]), dataset);
    }

    #[test]
    fn errors_are_reachable_from_the_crate_root() {
        let err: crate::Error = crate::error::Error::NotEnoughSamples;
        assert!(matches!(err, crate::Error::NotEnoughSamples));
    }

    #[test]
    fn label_frequencies_respect_mask() {
        let dataset = Dataset::new(Array2::<f64>::zeros((5, 1)), array![0usize, 0, 1, 1, 1]);
        let freqs = dataset.label_frequencies_with_mask(&[true, false, true, true, false]);

        assert_abs_diff_eq!(freqs[&0], 1.0);
        assert_abs_diff_eq!(freqs[&1], 2.0);

        let all = dataset.label_frequencies();
        assert_abs_diff_eq!(all[&1], 3.0);
    }

    #[test]
    fn split_with_ratio_keeps_every_sample() {
        let records = Array2::from_shape_fn((10, 3), |(i, j)| (i * 3 + j) as f64);
        let targets = (0..10).map(|x| x % 2).collect::<Array1<usize>>();
        let dataset = Dataset::new(records, targets)
            .with_feature_names(vec!["a", "b", "c"])
            .with_target_names(vec!["even", "odd"]);

        let (train, valid) = dataset.split_with_ratio(0.8);
        assert_eq!(train.nsamples(), 8);
        assert_eq!(valid.nsamples(), 2);
        assert_eq!(valid.records.row(0).to_vec(), vec![24., 25., 26.]);
        assert_eq!(valid.feature_names(), vec!["a", "b", "c"]);
        assert_eq!(train.target_names(), &["even".to_string(), "odd".to_string()]);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = SmallRng::seed_from_u64(42);
        let records = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let targets = (0..20).collect::<Array1<usize>>();

        let shuffled = Dataset::new(records, targets).shuffle(&mut rng);

        // every record still carries its own target
        for (row, target) in shuffled.records.rows().into_iter().zip(shuffled.targets.iter()) {
            assert_abs_diff_eq!(row[0], *target as f64);
        }
        let mut seen = shuffled.targets.to_vec();
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn select_features_keeps_names() {
        let dataset = Dataset::new(array![[1., 2., 3.]], array![0usize])
            .with_feature_names(vec!["n", "p", "k"]);

        let sub = dataset.select_features(&[2, 0]);
        assert_eq!(sub.records, array![[3., 1.]]);
        assert_eq!(sub.feature_names(), vec!["k", "n"]);
    }

    #[test]
    fn bootstrap_draws_requested_size() {
        let mut rng = SmallRng::seed_from_u64(7);
        let dataset = Dataset::new(array![[1.], [2.], [3.]], array![0usize, 1, 2]);

        let sample = dataset.bootstrap_samples(5, &mut rng);
        assert_eq!(sample.nsamples(), 5);
        for (row, target) in sample.records.rows().into_iter().zip(sample.targets.iter()) {
            assert_abs_diff_eq!(row[0], (*target + 1) as f64);
        }
    }
}
