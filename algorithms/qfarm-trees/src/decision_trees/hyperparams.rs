//! Hyperparameters of a single classification tree
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use qfarm::{
    error::{Error, Result},
    Float, Label, ParamGuard,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::DecisionTree;

/// Nodes lighter than this are never split
pub const DEFAULT_MIN_WEIGHT_SPLIT: f32 = 2.0;
/// Weight both children of a split carry at least
pub const DEFAULT_MIN_WEIGHT_LEAF: f32 = 1.0;
/// Smallest impurity improvement a split has to bring
pub const DEFAULT_MIN_IMPURITY_DECREASE: f64 = 1e-5;

/// Impurity measure minimized when choosing a split
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitQuality {
    /// `1 - Σ p²` over the class shares of a node
    Gini,
    /// `-Σ p log2(p)` over the class shares of a node, splits maximize the information gain
    Entropy,
}

impl Default for SplitQuality {
    fn default() -> Self {
        SplitQuality::Gini
    }
}

impl fmt::Display for SplitQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SplitQuality::Gini => write!(f, "gini"),
            SplitQuality::Entropy => write!(f, "entropy"),
        }
    }
}

impl FromStr for SplitQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gini" => Ok(SplitQuality::Gini),
            "entropy" => Ok(SplitQuality::Entropy),
            _ => Err(Error::Parameters(format!(
                "unknown split quality `{}`, expected gini or entropy",
                s
            ))),
        }
    }
}

/// Checked hyperparameters of a [decision tree](DecisionTree)
///
/// ```rust
/// use qfarm_trees::{DecisionTree, SplitQuality};
/// use qfarm::prelude::*;
///
/// let params = DecisionTree::params()
///     .split_quality(SplitQuality::Entropy)
///     .max_depth(Some(8))
///     .min_weight_leaf(1.);
///
/// let dataset = qfarm_datasets::crop_recommendation();
/// let tree = params.fit(&dataset).unwrap();
///
/// let accuracy = tree.predict(&dataset).confusion_matrix(&dataset).unwrap().accuracy();
/// assert!(accuracy > 0.9);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug)]
pub struct DecisionTreeValidParams<F, L> {
    split_quality: SplitQuality,
    max_depth: Option<usize>,
    min_weight_split: f32,
    min_weight_leaf: f32,
    min_impurity_decrease: F,

    label_marker: PhantomData<L>,
}

impl<F: Float, L> Default for DecisionTreeValidParams<F, L> {
    fn default() -> Self {
        DecisionTreeValidParams {
            split_quality: SplitQuality::default(),
            max_depth: None,
            min_weight_split: DEFAULT_MIN_WEIGHT_SPLIT,
            min_weight_leaf: DEFAULT_MIN_WEIGHT_LEAF,
            min_impurity_decrease: F::cast(DEFAULT_MIN_IMPURITY_DECREASE),
            label_marker: PhantomData,
        }
    }
}

impl<F: Float, L> DecisionTreeValidParams<F, L> {
    pub fn split_quality(&self) -> SplitQuality {
        self.split_quality
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_weight_split(&self) -> f32 {
        self.min_weight_split
    }

    pub fn min_weight_leaf(&self) -> f32 {
        self.min_weight_leaf
    }

    pub fn min_impurity_decrease(&self) -> F {
        self.min_impurity_decrease
    }

    fn validate(&self) -> Result<()> {
        if self.min_impurity_decrease < F::epsilon() {
            return Err(Error::Parameters(format!(
                "min_impurity_decrease must be positive, got {}",
                self.min_impurity_decrease
            )));
        }

        for (name, weight) in [
            ("min_weight_split", self.min_weight_split),
            ("min_weight_leaf", self.min_weight_leaf),
        ]
        .iter()
        {
            if !(*weight >= 0.0) {
                return Err(Error::Parameters(format!(
                    "{} must not be negative, got {}",
                    name, weight
                )));
            }
        }

        Ok(())
    }
}

/// Unchecked hyperparameters of a [decision tree](DecisionTree), see [`DecisionTree::params`]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug)]
pub struct DecisionTreeParams<F, L>(DecisionTreeValidParams<F, L>);

impl<F: Float, L: Label> DecisionTreeParams<F, L> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams::default())
    }

    /// Impurity measure used to rank candidate splits
    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.split_quality = split_quality;
        self
    }

    /// Stop growing below this depth, `None` grows until the leaves are pure
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Nodes lighter than this are never split
    ///
    /// Unweighted observations count as one, so this is a sample count for plain datasets.
    pub fn min_weight_split(mut self, min_weight_split: f32) -> Self {
        self.0.min_weight_split = min_weight_split;
        self
    }

    /// Both sides of a split must carry at least this weight
    pub fn min_weight_leaf(mut self, min_weight_leaf: f32) -> Self {
        self.0.min_weight_leaf = min_weight_leaf;
        self
    }

    /// Splits improving the impurity by less than this are rejected, must be positive
    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }
}

impl<F: Float, L: Label> Default for DecisionTreeParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> DecisionTree<F, L> {
    /// Gini splits, unlimited depth, nodes of at least two samples, leaves of at least one
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F, L> {
        DecisionTreeParams::new()
    }
}

impl<F: Float, L> ParamGuard for DecisionTreeParams<F, L> {
    type Checked = DecisionTreeValidParams<F, L>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        self.0.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.0.validate()?;
        Ok(self.0)
    }
}
