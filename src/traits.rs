//! Provide traits for different classes of algorithms
//!

use crate::dataset::{DatasetBase, Records};
use ndarray::{ArrayBase, Data, Ix2};
use std::convert::From;

/// Fittable algorithms
///
/// A fittable algorithm takes a dataset and creates a concept of some kind about it. For example
/// in *KMeans* this would be the mean values for each class, or in *SVM* the separating
/// hyperplane. It returns a model, which can be used to predict targets for new data.
pub trait Fit<R: Records, T, E: std::error::Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> Result<Self::Object, E>;
}

/// Predict with model
///
/// This trait assumes the `PredictInplace` implementation and provides additional input/output
/// combinations.
///
/// # Provided implementation
///
/// * Array2 -> Array1/Array2 (owned and borrowed records)
/// * Dataset -> Array1/Array2
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}

/// Predict with model into a mutable reference of targets.
pub trait PredictInplace<R: Records, T> {
    /// Predict something in place
    fn predict_inplace<'a>(&'a self, x: &'a R, y: &mut T);

    /// Create targets that `predict_inplace` works with.
    fn default_target(&self, x: &R) -> T;
}

impl<D, T, O> Predict<ArrayBase<D, Ix2>, T> for O
where
    D: Data,
    O: PredictInplace<ArrayBase<D, Ix2>, T>,
{
    fn predict(&self, records: ArrayBase<D, Ix2>) -> T {
        let mut targets = self.default_target(&records);
        self.predict_inplace(&records, &mut targets);
        targets
    }
}

impl<R: Records, T, O: PredictInplace<R, T>> Predict<&R, T> for O {
    fn predict(&self, records: &R) -> T {
        let mut targets = self.default_target(records);
        self.predict_inplace(records, &mut targets);
        targets
    }
}

impl<'a, R: Records, T, S, O: PredictInplace<R, S>> Predict<&'a DatasetBase<R, T>, S> for O {
    fn predict(&self, ds: &'a DatasetBase<R, T>) -> S {
        let mut targets = self.default_target(&ds.records);
        self.predict_inplace(&ds.records, &mut targets);
        targets
    }
}
