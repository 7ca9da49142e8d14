use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisoryError>;

/// Errors raised by the advisory components
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error(transparent)]
    Model(#[from] qfarm::Error),
    #[error(transparent)]
    Dataset(#[from] qfarm_datasets::DatasetError),
    #[error("the model expects {expected} features ({schema}), got {found}")]
    FeatureMismatch {
        schema: String,
        expected: usize,
        found: usize,
    },
    #[error("the readings have no `{0}` column, which the model was fit on")]
    MissingColumn(String),
    #[error("no reading matches the model feature `{0}`")]
    UnmatchedFeature(String),
    #[error("unknown optimization goal `{0}`")]
    UnknownGoal(String),
    #[error("unknown scheduler `{0}`, expected auto, eigen-solver or fallback")]
    UnknownScheduler(String),
    #[error("the eigen-solver scheduler is not compiled in, rebuild with the `eigen-solver` feature")]
    SolverUnavailable,
    #[error("irrigation program: {0}")]
    Program(String),
    #[error("the solver returned an infeasible schedule {0:?}")]
    Infeasible(Vec<u8>),
    #[error("invalid test ratio {0}, expected a value in (0, 1)")]
    TestRatio(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_are_wrapped() {
        let err: AdvisoryError = qfarm::Error::NotEnoughSamples.into();

        assert!(matches!(err, AdvisoryError::Model(qfarm::Error::NotEnoughSamples)));
        assert_eq!(err.to_string(), qfarm::Error::NotEnoughSamples.to_string());
    }
}
