use thiserror::Error;

/// Errors surfaced by the training engine and its collaborators.
#[derive(Error, Debug)]
pub enum RlError {
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    #[error("replay source holds {available} transitions, {requested} requested")]
    InsufficientSamples { requested: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("torch error: {0}")]
    Torch(#[from] tch::TchError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("plot error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, RlError>;

/// Fails with [`RlError::DimensionMismatch`] unless `actual == expected`.
pub(crate) fn ensure_dim(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RlError::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
