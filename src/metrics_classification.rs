//! Common metrics for performance evaluation of classifier
//!
//! Scoring is essential for classification tasks. This module implements a confusion matrix
//! together with the scoring functions derived from it: accuracy, precision, recall and f1-score.
use std::collections::HashMap;
use std::fmt;

use ndarray::prelude::*;
use ndarray::Data;

use crate::dataset::{AsTargets, DatasetBase, Label, Records};
use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Return tuple of class index for each element of prediction and ground_truth
fn map_prediction_to_idx<L: Label>(
    prediction: &[L],
    ground_truth: &[L],
    classes: &[L],
) -> Vec<Option<(usize, usize)>> {
    // create a map from class label to index
    let set = classes
        .iter()
        .enumerate()
        .map(|(a, b)| (b, a))
        .collect::<HashMap<_, usize>>();

    // indices for every prediction
    prediction
        .iter()
        .zip(ground_truth.iter())
        .map(|(a, b)| set.get(&a).and_then(|x| set.get(&b).map(|y| (*x, *y))))
        .collect::<Vec<Option<_>>>()
}

/// Confusion matrix for multi-label evaluation
///
/// A confusion matrix shows predictions in a matrix, where rows correspond to predicted and
/// columns to ground truth. The diagonal entries are correct predictions.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone)]
pub struct ConfusionMatrix<L> {
    matrix: Array2<f32>,
    members: Array1<L>,
}

impl<L> ConfusionMatrix<L> {
    /// Calculate precision for every class
    pub fn precision(&self) -> Array1<f32> {
        let sum = self.matrix.sum_axis(Axis(1));

        self.matrix
            .diag()
            .iter()
            .zip(sum.iter())
            .map(|(a, b)| if *b > 0.0 { a / b } else { 0.0 })
            .collect()
    }

    /// Calculate recall for every class
    pub fn recall(&self) -> Array1<f32> {
        let sum = self.matrix.sum_axis(Axis(0));

        self.matrix
            .diag()
            .iter()
            .zip(sum.iter())
            .map(|(a, b)| if *b > 0.0 { a / b } else { 0.0 })
            .collect()
    }

    /// Return mean accuracy
    pub fn accuracy(&self) -> f32 {
        let total = self.matrix.sum();
        if total > 0.0 {
            self.matrix.diag().sum() / total
        } else {
            0.0
        }
    }

    /// Return the f1-score for every class
    pub fn f1_score(&self) -> Array1<f32> {
        let precision = self.precision();
        let recall = self.recall();

        precision
            .iter()
            .zip(recall.iter())
            .map(|(p, r)| if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 })
            .collect()
    }

    /// Return the classes in the order of rows and columns
    pub fn members(&self) -> ArrayView1<L> {
        self.members.view()
    }
}

/// Print a confusion matrix
impl<L: fmt::Debug> fmt::Debug for ConfusionMatrix<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let len = self.matrix.len_of(Axis(0));
        writeln!(f)?;
        write!(f, "{:<12}", "classes")?;
        for member in self.members.iter() {
            write!(f, " | {:>10?}", member)?;
        }
        writeln!(f)?;

        for i in 0..len {
            write!(f, "{:<12?}", self.members[i])?;

            for j in 0..len {
                write!(f, " | {:>10}", self.matrix[(i, j)])?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Classification for multi-label evaluation
///
/// Contains a routine to calculate the confusion matrix, all other scores are derived form it.
pub trait ToConfusionMatrix<L, T> {
    fn confusion_matrix(&self, ground_truth: T) -> Result<ConfusionMatrix<L>>;
}

impl<L: Label, S: Data<Elem = L>, T: AsTargets<Elem = L>> ToConfusionMatrix<L, &T>
    for ArrayBase<S, Ix1>
{
    fn confusion_matrix(&self, ground_truth: &T) -> Result<ConfusionMatrix<L>> {
        let ground_truth = ground_truth.as_targets();
        if self.len() != ground_truth.len() {
            return Err(Error::MismatchedShapes {
                expected: ground_truth.len(),
                found: self.len(),
            });
        }

        let prediction = self.to_vec();
        let ground_truth = ground_truth.to_vec();

        // every class seen in either the prediction or the ground truth
        let mut classes: Vec<L> = Vec::new();
        for label in prediction.iter().chain(ground_truth.iter()) {
            if !classes.contains(label) {
                classes.push(label.clone());
            }
        }

        let indices = map_prediction_to_idx(&prediction, &ground_truth, &classes);

        let mut confusion_matrix = Array2::zeros((classes.len(), classes.len()));
        for (i1, i2) in indices.into_iter().flatten() {
            confusion_matrix[(i1, i2)] += 1.0;
        }

        Ok(ConfusionMatrix {
            matrix: confusion_matrix,
            members: Array1::from(classes),
        })
    }
}

impl<L: Label, S: Data<Elem = L>, R: Records, T: AsTargets<Elem = L>>
    ToConfusionMatrix<L, &DatasetBase<R, T>> for ArrayBase<S, Ix1>
{
    fn confusion_matrix(&self, ground_truth: &DatasetBase<R, T>) -> Result<ConfusionMatrix<L>> {
        self.confusion_matrix(&ground_truth.targets)
    }
}
