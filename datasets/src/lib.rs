//! `qfarm-datasets` provides the crop datasets used to train the Q-Farm crop classifier.
//!
//! ## The Big Picture
//!
//! `qfarm-datasets` is a crate in the `qfarm` workspace. It bundles two small datasets and
//! the loaders needed to bring your own data:
//!
//! * `["advisory"]` : the six-row soil/climate table the interactive advisor is trained on
//!   (six features, no rainfall)
//! * `["crop-recommendation"]` : a sample of the crop recommendation table
//!   (seven features including rainfall)
//!
//! Loaded datasets are returned as a [`qfarm::Dataset`] with named features and named targets.
//! Every class index in the targets refers to an entry of `target_names()`.
//!
//! ## Using a dataset
//!
//! ```
//! let dataset = qfarm_datasets::advisory();
//! assert_eq!(dataset.nfeatures(), 6);
//! assert_eq!(dataset.target_names()[0], "Rice");
//! ```
//!
//! Your own CSV files need a header row and a `label` column, every other column is
//! parsed as a numeric feature:
//!
//! ```
//! let csv = "N,P,K,temperature,humidity,ph,label\n90,42,43,20,80,6.5,Rice\n";
//! let dataset = qfarm_datasets::load_labelled_csv(csv.as_bytes()).unwrap();
//! assert_eq!(dataset.nsamples(), 1);
//! ```

mod dataset;
mod error;

pub use dataset::*;
pub use error::{DatasetError, Result};
