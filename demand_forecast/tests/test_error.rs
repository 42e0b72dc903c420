use demand_forecast::error::ForecastError;
use std::io;

#[test]
fn test_error_display() {
    let err = ForecastError::InsufficientData("no rows".to_string());
    assert_eq!(err.to_string(), "Insufficient data: no rows");

    let err = ForecastError::ModelNotTrained("train first".to_string());
    assert_eq!(err.to_string(), "Model not trained: train first");

    let err = ForecastError::MalformedInput("no SKU column".to_string());
    assert_eq!(err.to_string(), "Malformed input: no SKU column");
}

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: ForecastError = io_error.into();
    assert!(matches!(err, ForecastError::IoError(_)));

    let math = stock_math::MathError::InvalidInput("bad".to_string());
    let err: ForecastError = math.into();
    assert!(matches!(err, ForecastError::MathError(_)));
    assert_eq!(err.to_string(), "Math error: Invalid input: bad");

    let json = serde_json::from_str::<Vec<f64>>("not json").unwrap_err();
    let err: ForecastError = json.into();
    assert!(matches!(err, ForecastError::SerializationError(_)));
}
