//! Daily irrigation planning
//!
//! A schedule switches on at most one of three daily slots. Two schedulers produce it: an
//! exact solver of the underlying binary program (cargo feature `eigen-solver`) and a weighted
//! random draw used when the solver is not compiled in. The scheduler is chosen once, through
//! [`select_scheduler`].
use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use tracing::info;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{AdvisoryError, Result};

#[cfg(feature = "eigen-solver")]
mod eigen;
mod fallback;

#[cfg(feature = "eigen-solver")]
pub use eigen::*;
pub use fallback::*;

/// Time of day at which a field can be irrigated
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Morning,
    Noon,
    Evening,
}

impl Slot {
    /// Slots in schedule order
    pub const ALL: [Slot; 3] = [Slot::Morning, Slot::Noon, Slot::Evening];

    pub fn name(&self) -> &'static str {
        match self {
            Slot::Morning => "morning",
            Slot::Noon => "noon",
            Slot::Evening => "evening",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Binary indicators for the morning, noon and evening slots
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct IrrigationSchedule([u8; 3]);

impl IrrigationSchedule {
    /// Irrigate in a single slot
    pub fn single(slot: Slot) -> Self {
        let mut bits = [0; 3];
        bits[slot as usize] = 1;
        IrrigationSchedule(bits)
    }

    /// Build a schedule from indicators in slot order
    ///
    /// Fails unless there are exactly three indicators, each zero or one, with at most one set.
    pub fn from_bits(bits: &[u8]) -> Result<Self> {
        if bits.len() != 3 || bits.iter().any(|b| *b > 1) {
            return Err(AdvisoryError::Program(format!(
                "a schedule needs three binary indicators, got {:?}",
                bits
            )));
        }

        let schedule = IrrigationSchedule([bits[0], bits[1], bits[2]]);
        if !schedule.is_feasible() {
            return Err(AdvisoryError::Infeasible(bits.to_vec()));
        }

        Ok(schedule)
    }

    pub fn bits(&self) -> [u8; 3] {
        self.0
    }

    /// Whether at most one slot is switched on
    pub fn is_feasible(&self) -> bool {
        self.0.iter().map(|b| *b as u32).sum::<u32>() <= 1
    }

    /// The slots that are switched on
    pub fn slots(&self) -> Vec<Slot> {
        Slot::ALL
            .iter()
            .zip(self.0.iter())
            .filter(|(_, bit)| **bit == 1)
            .map(|(slot, _)| *slot)
            .collect()
    }
}

impl fmt::Display for IrrigationSchedule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0[0], self.0[1], self.0[2])?;
        match self.slots().first() {
            Some(slot) => write!(f, " ({})", slot),
            None => write!(f, " (no irrigation)"),
        }
    }
}

/// Produces an irrigation schedule
///
/// Randomized schedulers draw from `rng`; deterministic ones ignore it.
pub trait IrrigationScheduler {
    /// Short name used in logs and on the command line
    fn name(&self) -> &'static str;

    fn schedule(&self, rng: &mut dyn RngCore) -> Result<IrrigationSchedule>;
}

/// Which scheduler to use
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "kebab-case")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerKind {
    /// The solver if compiled in, the weighted fallback otherwise
    Auto,
    EigenSolver,
    Fallback,
}

impl Default for SchedulerKind {
    fn default() -> Self {
        SchedulerKind::Auto
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchedulerKind::Auto => write!(f, "auto"),
            SchedulerKind::EigenSolver => write!(f, "eigen-solver"),
            SchedulerKind::Fallback => write!(f, "fallback"),
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = AdvisoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SchedulerKind::Auto),
            "eigen-solver" | "eigen" | "solver" => Ok(SchedulerKind::EigenSolver),
            "fallback" | "weighted" => Ok(SchedulerKind::Fallback),
            _ => Err(AdvisoryError::UnknownScheduler(s.to_string())),
        }
    }
}

/// Whether the exact solver was compiled in
pub fn eigen_solver_available() -> bool {
    cfg!(feature = "eigen-solver")
}

#[cfg(feature = "eigen-solver")]
fn eigen_scheduler() -> Result<Box<dyn IrrigationScheduler>> {
    Ok(Box::new(EigenSolverScheduler::new()?))
}

#[cfg(not(feature = "eigen-solver"))]
fn eigen_scheduler() -> Result<Box<dyn IrrigationScheduler>> {
    Err(AdvisoryError::SolverUnavailable)
}

/// Build the scheduler for `kind`
///
/// Asking for the solver when it was not compiled in is an error. `Auto` never fails for that
/// reason, it falls back to the weighted draw and logs its choice.
pub fn select_scheduler(kind: SchedulerKind) -> Result<Box<dyn IrrigationScheduler>> {
    let scheduler: Box<dyn IrrigationScheduler> = match kind {
        SchedulerKind::EigenSolver => eigen_scheduler()?,
        SchedulerKind::Fallback => Box::new(WeightedFallbackScheduler::default()),
        SchedulerKind::Auto => match eigen_scheduler() {
            Ok(scheduler) => scheduler,
            Err(AdvisoryError::SolverUnavailable) => Box::new(WeightedFallbackScheduler::default()),
            Err(err) => return Err(err),
        },
    };

    info!(requested = %kind, scheduler = scheduler.name(), "selected irrigation scheduler");

    Ok(scheduler)
}
