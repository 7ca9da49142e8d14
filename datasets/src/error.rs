use ndarray::ShapeError;
use ndarray_csv::ReadError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors raised while loading a crop dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("could not read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed readings table: {0}")]
    Read(#[from] ReadError),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("the csv header has no `{0}` column")]
    MissingLabelColumn(String),
    #[error("row {row}: column `{column}` holds `{value}`, which is not a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("the dataset contains no samples")]
    Empty,
}
