use std::marker::PhantomData;
use std::str::FromStr;

use qfarm::{
    error::{Error, Result},
    Float, Label, ParamGuard,
};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::{DecisionTreeParams, RandomForestClassifier, SplitQuality};

/// Number of features every tree of the forest is allowed to look at
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaxFeatures {
    /// Square root of the number of features
    Sqrt,
    /// Binary logarithm of the number of features
    Log2,
    /// Every feature, which turns the forest into plain bagging
    All,
    /// A fraction in `(0, 1]` of the number of features
    Fraction(f32),
    /// A fixed number of features
    Count(usize),
}

impl MaxFeatures {
    /// Resolve the number of features drawn for each tree out of `nfeatures`
    ///
    /// The result always lies in `1..=nfeatures`.
    pub fn resolve(&self, nfeatures: usize) -> usize {
        let n = nfeatures as f32;
        let count = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::All => nfeatures,
            MaxFeatures::Fraction(ratio) => (n * ratio).ceil() as usize,
            MaxFeatures::Count(count) => *count,
        };

        count.max(1).min(nfeatures.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = Error;

    /// Parse `sqrt`, `log2`, `all`, a fraction such as `0.5` or a count such as `3`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            other => {
                if let Ok(count) = other.parse::<usize>() {
                    Ok(MaxFeatures::Count(count))
                } else if let Ok(ratio) = other.parse::<f32>() {
                    Ok(MaxFeatures::Fraction(ratio))
                } else {
                    Err(Error::Parameters(format!(
                        "unknown max features `{}`, expected sqrt, log2, all, a fraction or a count",
                        s
                    )))
                }
            }
        }
    }
}

/// The set of hyperparameters that can be specified for fitting a
/// [random forest](RandomForestClassifier).
///
/// ### Example
///
/// ```rust
/// use qfarm_trees::{MaxFeatures, RandomForestClassifier};
/// use qfarm::prelude::*;
///
/// let params = RandomForestClassifier::params()
///     .n_trees(20)
///     .max_features(MaxFeatures::Sqrt)
///     .max_depth(Some(8))
///     .seed(42);
///
/// let dataset = qfarm_datasets::crop_recommendation();
/// let forest = params.fit(&dataset).unwrap();
///
/// assert_eq!(forest.num_trees(), 20);
/// ```
#[derive(Clone, Debug)]
pub struct RandomForestValidParams<F, L> {
    n_trees: usize,
    bootstrap: bool,
    max_samples: Option<usize>,
    max_features: MaxFeatures,
    seed: Option<u64>,
    /// Trees are grown on class indices, not on the labels themselves
    tree_params: DecisionTreeParams<F, usize>,

    label_marker: PhantomData<L>,
}

impl<F: Float, L: Label> RandomForestValidParams<F, L> {
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn max_samples(&self) -> Option<usize> {
        self.max_samples
    }

    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn tree_params(&self) -> &DecisionTreeParams<F, usize> {
        &self.tree_params
    }
}

#[derive(Clone, Debug)]
pub struct RandomForestParams<F, L>(RandomForestValidParams<F, L>);

impl<F: Float, L: Label> RandomForestParams<F, L> {
    pub fn new() -> Self {
        Self(RandomForestValidParams {
            n_trees: 100,
            bootstrap: true,
            max_samples: None,
            max_features: MaxFeatures::Sqrt,
            seed: None,
            tree_params: DecisionTreeParams::new(),
            label_marker: PhantomData,
        })
    }

    /// Sets the number of trees in the forest
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.0.n_trees = n_trees;
        self
    }

    /// If set to true, every tree is grown on a sample drawn with replacement. Otherwise
    /// every tree sees a sample drawn without replacement, which covers the whole dataset
    /// unless `max_samples` is set.
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.0.bootstrap = bootstrap;
        self
    }

    /// Sets the number of observations drawn for every tree, defaults to the dataset size
    pub fn max_samples(mut self, max_samples: Option<usize>) -> Self {
        self.0.max_samples = max_samples;
        self
    }

    /// Sets the number of features drawn for every tree
    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.0.max_features = max_features;
        self
    }

    /// Seeds the random number generator, making fitting reproducible
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = Some(seed);
        self
    }

    /// Sets the optional limit to the depth of every tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.tree_params = self.0.tree_params.max_depth(max_depth);
        self
    }

    /// Sets the split quality of every tree
    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.tree_params = self.0.tree_params.split_quality(split_quality);
        self
    }

    /// Replaces the parameters every tree is grown with
    pub fn tree_params(mut self, tree_params: DecisionTreeParams<F, usize>) -> Self {
        self.0.tree_params = tree_params;
        self
    }
}

impl<F: Float, L: Label> Default for RandomForestParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L: Label> RandomForestClassifier<F, L> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `n_trees = 100`
    /// * `bootstrap = true`
    /// * `max_samples = None`
    /// * `max_features = MaxFeatures::Sqrt`
    /// * `seed = None`, the generator is seeded from the operating system
    /// * `tree_params = DecisionTree::params()`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> RandomForestParams<F, L> {
        RandomForestParams::new()
    }
}

impl<F: Float, L: Label> ParamGuard for RandomForestParams<F, L> {
    type Checked = RandomForestValidParams<F, L>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_trees == 0 {
            return Err(Error::Parameters(
                "A random forest needs at least one tree".to_string(),
            ));
        }

        if self.0.max_samples == Some(0) {
            return Err(Error::Parameters(
                "Every tree needs at least one sample".to_string(),
            ));
        }

        match self.0.max_features {
            MaxFeatures::Fraction(ratio) if !(ratio > 0.0 && ratio <= 1.0) => {
                return Err(Error::Parameters(format!(
                    "The fraction of features should be in (0, 1], but was {}",
                    ratio
                )))
            }
            MaxFeatures::Count(0) => {
                return Err(Error::Parameters(
                    "Every tree needs at least one feature".to_string(),
                ))
            }
            _ => {}
        }

        self.0.tree_params.check_ref()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_max_features() {
        assert_eq!(MaxFeatures::Sqrt.resolve(7), 2);
        assert_eq!(MaxFeatures::Log2.resolve(7), 2);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(7), 4);
        assert_eq!(MaxFeatures::Count(10).resolve(7), 7);
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
    }

    #[test]
    fn parse_max_features() {
        assert_eq!("sqrt".parse::<MaxFeatures>().unwrap(), MaxFeatures::Sqrt);
        assert_eq!("ALL".parse::<MaxFeatures>().unwrap(), MaxFeatures::All);
        assert_eq!("3".parse::<MaxFeatures>().unwrap(), MaxFeatures::Count(3));
        assert_eq!(
            "0.5".parse::<MaxFeatures>().unwrap(),
            MaxFeatures::Fraction(0.5)
        );
        assert!("most".parse::<MaxFeatures>().is_err());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = RandomForestClassifier::<f64, usize>::params();

        assert!(params.clone().n_trees(0).check().is_err());
        assert!(params.clone().max_samples(Some(0)).check().is_err());
        assert!(params
            .clone()
            .max_features(MaxFeatures::Fraction(1.5))
            .check()
            .is_err());
        assert!(params
            .clone()
            .max_features(MaxFeatures::Count(0))
            .check()
            .is_err());
        assert!(params
            .clone()
            .tree_params(DecisionTreeParams::new().min_impurity_decrease(0.0))
            .check()
            .is_err());
        assert!(params.check().is_ok());
    }
}
