//!
//! # Decision tree learning
//! `qfarm-trees` provides pure Rust implementations of the tree based classifiers the
//! Q-Farm crop advisor is built on.
//!
//! # The big picture
//!
//! Decision Trees (DTs) are a non-parametric supervised learning method used for classification.
//! The goal is to create a model that predicts the value of a target variable by learning simple
//! decision rules inferred from the data features. A [random forest](RandomForestClassifier)
//! aggregates many such trees, each grown on a bootstrap sample and a random subset of the
//! features, and predicts by majority vote.
//!
//! # Current state
//!
//! `qfarm-trees` currently provides single-tree fitting for classification with Gini or entropy
//! split quality, and a random forest classifier with defaults matching the usual
//! `RandomForestClassifier` configuration (100 trees, bootstrapping, `sqrt` features per tree).
//!

mod decision_trees;
mod random_forest;

pub use decision_trees::*;
pub use random_forest::*;

pub use qfarm::error::Result;
