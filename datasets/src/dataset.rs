use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use ndarray::prelude::*;
use ndarray_csv::Array2Reader;
use qfarm::Dataset;

use crate::error::{DatasetError, Result};

/// Name of the column holding the crop label in csv files
pub const LABEL_COLUMN: &str = "label";

/// Features of the interactive advisory table, in column order
pub const ADVISORY_FEATURES: [&str; 6] = ["N", "P", "K", "temperature", "humidity", "ph"];

/// Features of the crop recommendation table, in column order
pub const CROP_RECOMMENDATION_FEATURES: [&str; 7] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

/// Assign a class index to every label, in order of first appearance
///
/// Returns the encoded targets together with the label vocabulary.
pub fn encode_labels<S: AsRef<str>>(labels: &[S]) -> (Array1<usize>, Vec<String>) {
    let mut vocabulary: Vec<String> = Vec::new();
    let targets = labels
        .iter()
        .map(|label| {
            let label = label.as_ref();
            match vocabulary.iter().position(|known| known == label) {
                Some(idx) => idx,
                None => {
                    vocabulary.push(label.to_string());
                    vocabulary.len() - 1
                }
            }
        })
        .collect();

    (targets, vocabulary)
}

#[cfg(feature = "advisory")]
/// The soil and climate table the interactive advisor is fit on.
///
/// Six observations of nitrogen, phosphorus, potassium, temperature, humidity and soil pH,
/// labelled with one of five crops.
pub fn advisory() -> Dataset<f64, usize> {
    let records = array![
        [90., 42., 43., 20., 80., 6.5],
        [40., 20., 30., 25., 60., 7.0],
        [50., 40., 60., 30., 70., 5.5],
        [20., 10., 15., 18., 90., 6.0],
        [80., 50., 45., 35., 40., 7.5],
        [30., 30., 25., 28., 50., 6.8],
    ];
    let (targets, vocabulary) =
        encode_labels(&["Rice", "Wheat", "Maize", "Rice", "Cotton", "Barley"]);

    Dataset::new(records, targets)
        .with_feature_names(ADVISORY_FEATURES.to_vec())
        .with_target_names(vocabulary)
}

#[cfg(feature = "crop-recommendation")]
/// Read in the bundled sample of the crop recommendation table.
// The `.csv` data is two dimensional: Axis(0) denotes y-axis (rows), Axis(1) denotes x-axis (columns)
pub fn crop_recommendation() -> Dataset<f64, usize> {
    let data = include_bytes!("../data/crop_recommendation.csv.gz");

    load_labelled_csv(GzDecoder::new(&data[..])).expect("bundled crop table is well formed")
}

/// Parse a csv table with a header row and a `label` column
///
/// Every column other than `label` is parsed as a numeric feature, named after its header.
/// Labels are encoded in order of first appearance, see [`encode_labels`].
pub fn load_labelled_csv<R: Read>(csv: R) -> Result<Dataset<f64, usize>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(csv);

    let headers = reader.headers()?.clone();
    let label_idx = headers
        .iter()
        .position(|name| name == LABEL_COLUMN)
        .ok_or_else(|| DatasetError::MissingLabelColumn(LABEL_COLUMN.to_string()))?;

    let feature_names = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != label_idx)
        .map(|(_, name)| name.to_string())
        .collect::<Vec<_>>();

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for (col, field) in record.iter().enumerate() {
            if col == label_idx {
                labels.push(field.to_string());
                continue;
            }

            let value = field
                .parse::<f64>()
                .map_err(|_| DatasetError::InvalidValue {
                    row: row + 1,
                    column: headers[col].to_string(),
                    value: field.to_string(),
                })?;
            values.push(value);
        }
    }

    if labels.is_empty() {
        return Err(DatasetError::Empty);
    }

    let records = Array2::from_shape_vec((labels.len(), feature_names.len()), values)?;
    let (targets, vocabulary) = encode_labels(&labels);

    Ok(Dataset::new(records, targets)
        .with_feature_names(feature_names)
        .with_target_names(vocabulary))
}

/// Load a labelled csv table from disk
///
/// Files ending in `.gz` are decompressed on the fly.
pub fn load_labelled_csv_path<P: AsRef<Path>>(path: P) -> Result<Dataset<f64, usize>> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);

    if is_gzipped(path) {
        load_labelled_csv(GzDecoder::new(file))
    } else {
        load_labelled_csv(file)
    }
}

/// Convert CSV bytes of unlabelled readings into 2D array
///
/// The header row is returned alongside the readings so that the columns can be matched to
/// the features a model was trained on.
pub fn readings_from_csv<R: Read>(csv: R) -> Result<(Vec<String>, Array2<f64>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(csv);

    let headers = reader
        .headers()?
        .iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();

    // extract ndarray
    let readings: Array2<f64> = reader.deserialize_array2_dynamic()?;

    Ok((headers, readings))
}

/// Load unlabelled readings from disk, decompressing `.gz` files
pub fn readings_from_csv_path<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, Array2<f64>)> {
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);

    if is_gzipped(path) {
        readings_from_csv(GzDecoder::new(file))
    } else {
        readings_from_csv(file)
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}
