use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

use super::{IrrigationSchedule, IrrigationScheduler, Slot};
use crate::error::{AdvisoryError, Result};

/// Default probabilities of irrigating in the morning, at noon and in the evening
pub const DEFAULT_SLOT_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];

/// Draws a single irrigation slot at random
///
/// Every schedule switches on exactly one slot, picked with probability proportional to its
/// weight.
#[derive(Clone, Debug)]
pub struct WeightedFallbackScheduler {
    weights: [f64; 3],
}

impl Default for WeightedFallbackScheduler {
    fn default() -> Self {
        WeightedFallbackScheduler {
            weights: DEFAULT_SLOT_WEIGHTS,
        }
    }
}

impl WeightedFallbackScheduler {
    /// Use custom slot weights, in slot order
    ///
    /// Weights must be finite and non-negative, with at least one of them positive.
    pub fn with_weights(weights: [f64; 3]) -> Result<Self> {
        // validate once here, `schedule` rebuilds the distribution on every call
        WeightedIndex::new(&weights).map_err(|err| {
            AdvisoryError::Program(format!("invalid slot weights {:?}: {}", weights, err))
        })?;

        Ok(WeightedFallbackScheduler { weights })
    }

    pub fn weights(&self) -> [f64; 3] {
        self.weights
    }
}

impl IrrigationScheduler for WeightedFallbackScheduler {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn schedule(&self, rng: &mut dyn RngCore) -> Result<IrrigationSchedule> {
        let dist = WeightedIndex::new(&self.weights)
            .map_err(|err| AdvisoryError::Program(format!("invalid slot weights: {}", err)))?;
        let slot = Slot::ALL[dist.sample(rng)];
        tracing::debug!(%slot, "drew irrigation slot");

        Ok(IrrigationSchedule::single(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn exactly_one_slot_is_switched_on() {
        let scheduler = WeightedFallbackScheduler::default();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let bits = scheduler.schedule(&mut rng).unwrap().bits();
            assert_eq!(bits.len(), 3);
            assert_eq!(bits.iter().filter(|b| **b == 1).count(), 1);
            assert!(bits.iter().all(|b| *b <= 1));
        }
    }

    #[test]
    fn slots_follow_the_weights() {
        let scheduler = WeightedFallbackScheduler::default();
        let mut rng = StdRng::seed_from_u64(7);
        let draws = 20_000;

        let mut counts = [0usize; 3];
        for _ in 0..draws {
            let schedule = scheduler.schedule(&mut rng).unwrap();
            counts[schedule.slots()[0] as usize] += 1;
        }

        for (count, weight) in counts.iter().zip(DEFAULT_SLOT_WEIGHTS.iter()) {
            assert_abs_diff_eq!(*count as f64 / draws as f64, *weight, epsilon = 0.02);
        }
    }

    #[test]
    fn a_zero_weight_slot_is_never_drawn() {
        let scheduler = WeightedFallbackScheduler::with_weights([0.0, 1.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..50 {
            assert_eq!(
                scheduler.schedule(&mut rng).unwrap(),
                IrrigationSchedule::single(Slot::Noon)
            );
        }
    }

    #[test]
    fn invalid_weights_are_rejected() {
        assert!(WeightedFallbackScheduler::with_weights([0.0, 0.0, 0.0]).is_err());
        assert!(WeightedFallbackScheduler::with_weights([-1.0, 1.0, 1.0]).is_err());
    }
}
