//! Soil and climate readings fed to the crop classifier
use std::fmt;

use ndarray::Array1;
use qfarm_datasets::{ADVISORY_FEATURES, CROP_RECOMMENDATION_FEATURES};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{AdvisoryError, Result};
use crate::scoring::ClimateReadings;

/// The columns a crop classifier was fit on
///
/// The interactive advisory table has six features, the crop recommendation table adds
/// rainfall as a seventh. Any other labelled table is kept as a custom schema holding its
/// column names. A model only accepts readings that fill the schema it was fit on.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureSchema {
    /// `N, P, K, temperature, humidity, ph`
    Advisory,
    /// `N, P, K, temperature, humidity, ph, rainfall`
    CropRecommendation,
    /// Columns of any other dataset, in column order
    Custom(Vec<String>),
}

impl FeatureSchema {
    /// Names of the features, in column order
    pub fn feature_names(&self) -> Vec<&str> {
        match self {
            FeatureSchema::Advisory => ADVISORY_FEATURES.to_vec(),
            FeatureSchema::CropRecommendation => CROP_RECOMMENDATION_FEATURES.to_vec(),
            FeatureSchema::Custom(names) => names.iter().map(|name| name.as_str()).collect(),
        }
    }

    pub fn nfeatures(&self) -> usize {
        match self {
            FeatureSchema::Advisory => ADVISORY_FEATURES.len(),
            FeatureSchema::CropRecommendation => CROP_RECOMMENDATION_FEATURES.len(),
            FeatureSchema::Custom(names) => names.len(),
        }
    }

    /// Recognise the schema of a dataset from its feature names
    ///
    /// The two bundled layouts are matched without regard to case and in column order, every
    /// other list of names becomes a [`FeatureSchema::Custom`] schema.
    pub fn from_feature_names<S: AsRef<str>>(names: &[S]) -> Self {
        let same_as = |expected: &[&str]| {
            expected.len() == names.len()
                && expected
                    .iter()
                    .zip(names)
                    .all(|(expected, found)| expected.eq_ignore_ascii_case(found.as_ref()))
        };

        if same_as(&ADVISORY_FEATURES) {
            FeatureSchema::Advisory
        } else if same_as(&CROP_RECOMMENDATION_FEATURES) {
            FeatureSchema::CropRecommendation
        } else {
            FeatureSchema::Custom(names.iter().map(|name| name.as_ref().to_string()).collect())
        }
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeatureSchema::Advisory => write!(f, "advisory"),
            FeatureSchema::CropRecommendation => write!(f, "crop-recommendation"),
            FeatureSchema::Custom(names) => write!(f, "custom({})", names.join(", ")),
        }
    }
}

/// Readings of a single field
///
/// No range checks are applied, every reading is passed to the classifier as is.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: Option<f64>,
}

impl Default for FeatureVector {
    /// Readings of an untouched input form: 50 for every nutrient, 25 °C, 60 % humidity
    /// and a soil pH of 6.5
    fn default() -> Self {
        FeatureVector {
            nitrogen: 50.0,
            phosphorus: 50.0,
            potassium: 50.0,
            temperature: 25.0,
            humidity: 60.0,
            ph: 6.5,
            rainfall: None,
        }
    }
}

impl FeatureVector {
    /// The subset of readings the scoring heuristic and roadmap use
    pub fn climate(&self) -> ClimateReadings {
        ClimateReadings {
            temperature: self.temperature,
            humidity: self.humidity,
            ph: self.ph,
        }
    }

    /// Lay the readings out as a model row of the given schema
    ///
    /// Rainfall is ignored by the advisory schema and required by the crop recommendation
    /// schema. Custom schemas look every column up with [`reading`](Self::reading).
    pub fn to_row(&self, schema: &FeatureSchema) -> Result<Array1<f64>> {
        if let FeatureSchema::Custom(names) = schema {
            return names
                .iter()
                .map(|name| self.reading(name))
                .collect::<Result<Vec<_>>>()
                .map(Array1::from);
        }

        let mut row = vec![
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
        ];

        match (schema, self.rainfall) {
            (FeatureSchema::CropRecommendation, Some(rainfall)) => row.push(rainfall),
            (FeatureSchema::CropRecommendation, None) => {
                return Err(AdvisoryError::FeatureMismatch {
                    schema: schema.to_string(),
                    expected: schema.nfeatures(),
                    found: row.len(),
                })
            }
            (_, Some(_)) => {
                tracing::debug!("rainfall is not part of the advisory schema, ignoring it");
            }
            (_, None) => {}
        }

        Ok(Array1::from(row))
    }

    /// The reading stored under a column name, ignoring case
    ///
    /// Nutrients answer to their symbol or their name (`N` or `nitrogen`), temperature also
    /// to `temp` and rainfall to `rain`. Unknown names, and rainfall when it was not
    /// measured, are an error.
    pub fn reading(&self, name: &str) -> Result<f64> {
        let value = match name.trim().to_ascii_lowercase().as_str() {
            "n" | "nitrogen" => Some(self.nitrogen),
            "p" | "phosphorus" => Some(self.phosphorus),
            "k" | "potassium" => Some(self.potassium),
            "temperature" | "temp" => Some(self.temperature),
            "humidity" => Some(self.humidity),
            "ph" => Some(self.ph),
            "rainfall" | "rain" => self.rainfall,
            _ => None,
        };

        value.ok_or_else(|| AdvisoryError::UnmatchedFeature(name.to_string()))
    }
}
