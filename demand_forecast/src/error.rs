//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Empty or too-small input at some pipeline stage
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Prediction requested without a trained (or completely loaded) model
    #[error("Model not trained: {0}")]
    ModelNotTrained(String),

    /// Input table that cannot be interpreted at all, e.g. no SKU column
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error reading or writing model artifacts
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Error parsing the engine configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error writing delimited output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from the numeric building blocks
    #[error("Math error: {0}")]
    MathError(#[from] stock_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
