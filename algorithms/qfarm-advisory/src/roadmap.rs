//! Seven step farming roadmap
use std::fmt;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::scoring::ClimateReadings;

/// Above this temperature (°C) the crop needs shading
pub const HEAT_STRESS_TEMPERATURE: f64 = 30.0;
/// Below this relative humidity (%) irrigation is intensified
pub const DRY_AIR_HUMIDITY: f64 = 40.0;

/// An ordered list of farming steps for a crop
///
/// ```
/// use qfarm_advisory::{roadmap, ClimateReadings};
///
/// let readings = ClimateReadings { temperature: 35.0, humidity: 30.0, ph: 6.5 };
/// let plan = roadmap("Maize", &readings);
///
/// assert_eq!(plan.steps().len(), 7);
/// assert_eq!(plan.steps()[2], "Use shade nets to reduce heat stress");
/// assert!(plan.to_string().starts_with("1. Soil preparation for Maize cultivation"));
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Roadmap {
    crop: String,
    steps: Vec<String>,
}

impl Roadmap {
    pub fn crop(&self) -> &str {
        &self.crop
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }
}

impl fmt::Display for Roadmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            writeln!(f, "{}. {}", idx + 1, step)?;
        }

        Ok(())
    }
}

/// Build the roadmap for `crop`
///
/// Steps three and four depend on the temperature and the humidity, pH does not change the
/// plan. Any crop name is accepted.
pub fn roadmap(crop: &str, readings: &ClimateReadings) -> Roadmap {
    let sunlight = if readings.temperature > HEAT_STRESS_TEMPERATURE {
        "Use shade nets to reduce heat stress"
    } else {
        "Normal sunlight exposure recommended"
    };

    let irrigation = if readings.humidity < DRY_AIR_HUMIDITY {
        "Increase irrigation frequency"
    } else {
        "Standard irrigation schedule"
    };

    let steps = vec![
        format!("Soil preparation for {} cultivation", crop),
        "Adjust soil pH to optimal level (~6.5)".to_string(),
        sunlight.to_string(),
        irrigation.to_string(),
        "Apply NPK fertilizer as per AI nutrient recommendation".to_string(),
        "Monitor pests using AI vision system".to_string(),
        "Predict harvest window using Quantum climate forecast".to_string(),
    ];

    Roadmap {
        crop: crop.to_string(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(temperature: f64, humidity: f64) -> ClimateReadings {
        ClimateReadings {
            temperature,
            humidity,
            ph: 6.5,
        }
    }

    #[test]
    fn hot_and_dry() {
        let plan = roadmap("Maize", &readings(35.0, 30.0));

        assert_eq!(plan.crop(), "Maize");
        assert_eq!(plan.steps()[0], "Soil preparation for Maize cultivation");
        assert_eq!(plan.steps()[2], "Use shade nets to reduce heat stress");
        assert_eq!(plan.steps()[3], "Increase irrigation frequency");
    }

    #[test]
    fn mild_and_humid() {
        let plan = roadmap("Rice", &readings(20.0, 60.0));

        assert_eq!(plan.steps()[2], "Normal sunlight exposure recommended");
        assert_eq!(plan.steps()[3], "Standard irrigation schedule");
    }

    #[test]
    fn thresholds_are_exclusive() {
        let plan = roadmap("Rice", &readings(30.0, 40.0));

        assert_eq!(plan.steps()[2], "Normal sunlight exposure recommended");
        assert_eq!(plan.steps()[3], "Standard irrigation schedule");
    }

    #[test]
    fn fixed_steps_do_not_depend_on_readings() {
        for (t, h) in &[(35.0, 30.0), (20.0, 60.0), (-5.0, 0.0)] {
            let plan = roadmap("Cotton", &readings(*t, *h));

            assert_eq!(plan.steps().len(), 7);
            assert_eq!(plan.steps()[1], "Adjust soil pH to optimal level (~6.5)");
            assert_eq!(
                plan.steps()[4],
                "Apply NPK fertilizer as per AI nutrient recommendation"
            );
            assert_eq!(plan.steps()[5], "Monitor pests using AI vision system");
            assert_eq!(
                plan.steps()[6],
                "Predict harvest window using Quantum climate forecast"
            );
        }
    }

    #[test]
    fn displays_a_numbered_list() {
        let text = roadmap("", &readings(20.0, 60.0)).to_string();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "1. Soil preparation for  cultivation");
        assert_eq!(
            lines[6],
            "7. Predict harvest window using Quantum climate forecast"
        );
    }
}
