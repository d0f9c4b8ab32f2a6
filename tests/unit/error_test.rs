//! Tests for error types

use taskshift::core::AdmissionError;

#[test]
fn test_forecast_unavailable_error() {
    let err = AdmissionError::ForecastUnavailable("model offline".to_string());
    assert_eq!(format!("{}", err), "forecast unavailable: model offline");
}

#[test]
fn test_remote_unavailable_error() {
    let err = AdmissionError::RemoteUnavailable {
        operation: "list_pending".to_string(),
        attempts: 10,
        last_error: "connection refused".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "remote unavailable: list_pending failed after 10 attempts: connection refused"
    );
}

#[test]
fn test_empty_queue_error() {
    assert_eq!(format!("{}", AdmissionError::EmptyQueue), "queue is empty");
}

#[test]
fn test_invalid_override_error() {
    let err = AdmissionError::InvalidOverride("cpu ceiling 120 outside [0, 100]".to_string());
    assert!(format!("{}", err).starts_with("invalid override:"));
}

#[test]
fn test_errors_convert_into_anyhow() {
    fn fails() -> taskshift::core::AppResult<()> {
        Err(AdmissionError::Configuration("no nodes".to_string()).into())
    }
    let err = fails().unwrap_err();
    assert_eq!(
        err.downcast_ref::<AdmissionError>(),
        Some(&AdmissionError::Configuration("no nodes".to_string()))
    );
}
