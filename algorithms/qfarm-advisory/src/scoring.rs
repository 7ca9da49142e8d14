//! Goal-weighted scoring of the growing conditions
//!
//! The score multiplies a random base in `[0.7, 0.99)` with a goal dependent factor computed
//! from the climate readings. It is a heuristic, not a calibrated probability, and every call
//! draws fresh randomness from the generator it is given.
use std::fmt;
use std::str::FromStr;

use rand::Rng;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::AdvisoryError;

/// What the farmer wants to optimize for
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Goal {
    MaximizeYield,
    MinimizeWaterUsage,
    ReduceFertilizerCost,
    ClimateRiskResilience,
}

impl Goal {
    pub const ALL: [Goal; 4] = [
        Goal::MaximizeYield,
        Goal::MinimizeWaterUsage,
        Goal::ReduceFertilizerCost,
        Goal::ClimateRiskResilience,
    ];

    /// Human readable name, e.g. `Maximize Yield`
    pub fn name(&self) -> &'static str {
        match self {
            Goal::MaximizeYield => "Maximize Yield",
            Goal::MinimizeWaterUsage => "Minimize Water Usage",
            Goal::ReduceFertilizerCost => "Reduce Fertilizer Cost",
            Goal::ClimateRiskResilience => "Climate Risk Resilience",
        }
    }

    /// Short kebab-case alias, e.g. `maximize-yield`
    pub fn alias(&self) -> &'static str {
        match self {
            Goal::MaximizeYield => "maximize-yield",
            Goal::MinimizeWaterUsage => "minimize-water",
            Goal::ReduceFertilizerCost => "reduce-fertilizer",
            Goal::ClimateRiskResilience => "climate-risk",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Goal {
    type Err = AdvisoryError;

    /// Accepts the display name or the alias, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Goal::ALL
            .iter()
            .find(|goal| {
                goal.name().eq_ignore_ascii_case(needle)
                    || goal.alias().eq_ignore_ascii_case(needle)
                    || goal.name().replace(' ', "-").eq_ignore_ascii_case(needle)
            })
            .copied()
            .ok_or_else(|| AdvisoryError::UnknownGoal(s.to_string()))
    }
}

/// Temperature in °C, relative humidity in percent and soil pH
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateReadings {
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
}

impl Default for ClimateReadings {
    fn default() -> Self {
        ClimateReadings {
            temperature: 25.0,
            humidity: 60.0,
            ph: 6.5,
        }
    }
}

/// Score the readings for `goal`
///
/// The result lies in `[0, 1]` and is rounded to three decimals. Two draws are taken from
/// `rng` for [`Goal::ClimateRiskResilience`], one for every other goal.
///
/// ```
/// use qfarm_advisory::{score, ClimateReadings, Goal};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let readings = ClimateReadings { temperature: 25.0, humidity: 100.0, ph: 6.5 };
///
/// // saturated air leaves nothing to save
/// assert_eq!(score(Goal::MinimizeWaterUsage, &readings, &mut rng), 0.0);
/// ```
pub fn score<R: Rng + ?Sized>(goal: Goal, readings: &ClimateReadings, rng: &mut R) -> f64 {
    let base = rng.gen_range(0.7..0.99);

    let factor = match goal {
        Goal::MaximizeYield => (readings.temperature + readings.humidity + readings.ph) / 300.0,
        Goal::MinimizeWaterUsage => 1.0 - readings.humidity / 100.0,
        Goal::ReduceFertilizerCost => 1.0 - readings.ph / 14.0,
        Goal::ClimateRiskResilience => rng.gen_range(0.5..1.0),
    };
    let factor = factor.max(0.0).min(1.0);

    round_to_thousandths(base * factor)
}

fn round_to_thousandths(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Advice derived from a score
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisoryTier {
    /// score above 0.85
    Intensive,
    /// score above 0.7
    Moderate,
    HighRisk,
}

impl AdvisoryTier {
    pub fn from_score(score: f64) -> Self {
        if score > 0.85 {
            AdvisoryTier::Intensive
        } else if score > 0.7 {
            AdvisoryTier::Moderate
        } else {
            AdvisoryTier::HighRisk
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            AdvisoryTier::Intensive => "High yield expected. Intensive cultivation recommended.",
            AdvisoryTier::Moderate => "Moderate yield. Optimize irrigation & fertilizer.",
            AdvisoryTier::HighRisk => "High climate risk. Delay planting or change crop.",
        }
    }
}

impl fmt::Display for AdvisoryTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.advice())
    }
}

/// A score together with the goal it was computed for and the resulting advice
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Assessment {
    pub goal: Goal,
    pub score: f64,
    pub tier: AdvisoryTier,
}

impl Assessment {
    pub fn new<R: Rng + ?Sized>(goal: Goal, readings: &ClimateReadings, rng: &mut R) -> Self {
        let score = score(goal, readings, rng);
        tracing::debug!(goal = goal.name(), score, "scored growing conditions");

        Assessment {
            goal,
            score,
            tier: AdvisoryTier::from_score(score),
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} score: {:.3}\n{}", self.goal, self.score, self.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn extreme_readings() -> Vec<ClimateReadings> {
        let mut readings = Vec::new();
        for temperature in &[-20.0, 0.0, 25.0, 50.0, 400.0] {
            for humidity in &[0.0, 40.0, 100.0, 150.0] {
                for ph in &[0.0, 6.5, 14.0, 20.0] {
                    readings.push(ClimateReadings {
                        temperature: *temperature,
                        humidity: *humidity,
                        ph: *ph,
                    });
                }
            }
        }

        readings
    }

    #[test]
    fn scores_stay_in_the_unit_interval() {
        let mut rng = StdRng::seed_from_u64(42);

        for goal in &Goal::ALL {
            for readings in extreme_readings() {
                for _ in 0..10 {
                    let s = score(*goal, &readings, &mut rng);
                    assert!((0.0..=1.0).contains(&s), "{} gave {}", goal, s);
                    assert_abs_diff_eq!(s, round_to_thousandths(s), epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn saturated_air_saves_no_water() {
        let mut rng = StdRng::seed_from_u64(1);
        let readings = ClimateReadings {
            humidity: 100.0,
            ..ClimateReadings::default()
        };

        for _ in 0..20 {
            assert_eq!(score(Goal::MinimizeWaterUsage, &readings, &mut rng), 0.0);
        }
    }

    #[test]
    fn neutral_soil_halves_fertilizer_score() {
        let mut rng = StdRng::seed_from_u64(3);
        let readings = ClimateReadings {
            ph: 7.0,
            ..ClimateReadings::default()
        };

        for _ in 0..20 {
            let s = score(Goal::ReduceFertilizerCost, &readings, &mut rng);
            assert!(s >= 0.35 && s <= 0.495, "score {}", s);
        }
    }

    #[test]
    fn same_seed_same_score() {
        let readings = ClimateReadings::default();
        for goal in &Goal::ALL {
            let a = score(*goal, &readings, &mut StdRng::seed_from_u64(9));
            let b = score(*goal, &readings, &mut StdRng::seed_from_u64(9));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(AdvisoryTier::from_score(0.9), AdvisoryTier::Intensive);
        assert_eq!(AdvisoryTier::from_score(0.85), AdvisoryTier::Moderate);
        assert_eq!(AdvisoryTier::from_score(0.71), AdvisoryTier::Moderate);
        assert_eq!(AdvisoryTier::from_score(0.7), AdvisoryTier::HighRisk);
        assert_eq!(AdvisoryTier::from_score(0.0), AdvisoryTier::HighRisk);
        assert_eq!(
            AdvisoryTier::Moderate.to_string(),
            "Moderate yield. Optimize irrigation & fertilizer."
        );
    }

    #[test]
    fn parse_goals() {
        assert_eq!("Maximize Yield".parse::<Goal>().unwrap(), Goal::MaximizeYield);
        assert_eq!(
            "minimize-water".parse::<Goal>().unwrap(),
            Goal::MinimizeWaterUsage
        );
        assert_eq!(
            "reduce-fertilizer-cost".parse::<Goal>().unwrap(),
            Goal::ReduceFertilizerCost
        );
        assert_eq!(
            " climate risk resilience ".parse::<Goal>().unwrap(),
            Goal::ClimateRiskResilience
        );
        assert!(matches!(
            "maximize profit".parse::<Goal>(),
            Err(AdvisoryError::UnknownGoal(_))
        ));
    }
}
