//! # Crop advisory
//!
//! `qfarm-advisory` turns soil and climate readings into farming advice. It bundles four
//! independent components:
//!
//! * [`CropRecommender`]: a random forest answering "which crop fits these readings"
//! * [`score`]: a goal-weighted heuristic scoring the growing conditions, mapped to an
//!   [`AdvisoryTier`]
//! * [`roadmap`]: a seven step farming plan for a crop
//! * [`select_scheduler`]: a daily irrigation plan, solved exactly by the
//!   [`EigenSolverScheduler`] or drawn by the [`WeightedFallbackScheduler`]
//!
//! Randomized components take the generator as an argument, a seeded generator makes them
//! reproducible.
//!
//! ## Example
//!
//! ```
//! use qfarm_advisory::*;
//! use qfarm_trees::RandomForestClassifier;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let readings = FeatureVector::default();
//!
//! let recommender = CropRecommender::advisory(&RandomForestClassifier::params().seed(42))?;
//! let crop = recommender.recommend(&readings)?;
//!
//! let assessment = Assessment::new(Goal::MaximizeYield, &readings.climate(), &mut rng);
//! let plan = roadmap(crop, &readings.climate());
//! let schedule = select_scheduler(SchedulerKind::Auto)?.schedule(&mut rng)?;
//!
//! assert!((0.0..=1.0).contains(&assessment.score));
//! assert_eq!(plan.steps().len(), 7);
//! assert!(schedule.is_feasible());
//! # Ok::<(), AdvisoryError>(())
//! ```

mod error;
mod features;
mod irrigation;
mod recommender;
mod roadmap;
mod scoring;

pub use error::{AdvisoryError, Result};
pub use features::{FeatureSchema, FeatureVector};
pub use irrigation::*;
pub use recommender::{CropRecommender, TrainingReport};
pub use roadmap::{roadmap, Roadmap, DRY_AIR_HUMIDITY, HEAT_STRESS_TEMPERATURE};
pub use scoring::{score, AdvisoryTier, Assessment, ClimateReadings, Goal};
