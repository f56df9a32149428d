use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoeCalcError {
    #[error("Unknown precision: {0}")]
    UnknownPrecision(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MoeCalcError>;
