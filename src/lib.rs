//! `qfarm` provides the core building blocks of the Q-Farm crop advisory toolkit.
//!
//! The crate is intentionally small: it defines the dataset container the crop
//! classifier is trained on, the traits shared by every model (`Fit`, `Predict`,
//! `ParamGuard`) and a handful of classification metrics used to evaluate a
//! fitted model on hold-out data.
//!
//! ## The big picture
//!
//! The workspace is split the same way as a classical machine learning toolkit:
//!
//! * `qfarm` (this crate): datasets, traits and metrics
//! * `qfarm-datasets`: the bundled crop datasets and a CSV loader
//! * `qfarm-trees`: decision trees and the random forest classifier
//! * `qfarm-advisory`: crop recommendation, goal scoring, roadmap and irrigation planning
//! * `qfarm-cli`: the `qfarm` command line front-end
//!
//! ## Example
//!
//! ```rust
//! use qfarm::prelude::*;
//! use ndarray::array;
//!
//! let dataset = Dataset::new(array![[1., 2.], [3., 4.]], array![0usize, 1])
//!     .with_feature_names(vec!["nitrogen", "phosphorus"])
//!     .with_target_names(vec!["Rice", "Wheat"]);
//!
//! assert_eq!(dataset.nsamples(), 2);
//! assert_eq!(dataset.target_names(), &["Rice".to_string(), "Wheat".to_string()]);
//! ```

pub mod dataset;
pub mod error;
mod metrics_classification;
pub mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, Float, Label};
pub use error::Error;
pub use param_guard::ParamGuard;

/// Common metrics functions for classification
pub mod metrics {
    pub use crate::metrics_classification::{ConfusionMatrix, ToConfusionMatrix};
}
