/*!
 * Tests for error types and conversions
 */

use bulk_translate::errors::{AppError, PersistenceError, StepError, TransportError};

#[test]
fn test_stepError_rejected_shouldDisplayRemoteMessageVerbatim() {
    let error = StepError::rejected(Some("quota exceeded".to_string()));
    assert_eq!(error.to_string(), "quota exceeded");
}

#[test]
fn test_stepError_rejectedWithoutMessage_shouldUseGenericMessage() {
    assert_eq!(StepError::rejected(None).to_string(), "Translation failed");
    assert_eq!(
        StepError::rejected(Some("   ".to_string())).to_string(),
        "Translation failed"
    );
}

#[test]
fn test_stepError_cancelled_shouldDisplayCancellationMessage() {
    let error = StepError::Cancelled;
    assert_eq!(error.to_string(), "Translation cancelled");
    assert!(error.is_cancellation());
}

#[test]
fn test_stepError_fromConnectionError_shouldBecomeRequestFailed() {
    let error: StepError = TransportError::Connection("connection refused".to_string()).into();
    assert!(matches!(error, StepError::Transport(_)));
    assert_eq!(error.to_string(), "Request failed");
}

#[test]
fn test_stepError_fromMalformedBody_shouldBecomeRequestFailed() {
    let error: StepError = TransportError::Malformed("expected value".to_string()).into();
    assert_eq!(error.to_string(), "Request failed");
}

#[test]
fn test_stepError_fromHttpErrorWithMessage_shouldKeepMessage() {
    let error: StepError = TransportError::Http {
        status: 403,
        message: Some("Cookie check failed".to_string()),
    }
    .into();
    assert_eq!(error.to_string(), "Cookie check failed");
    assert!(!error.is_cancellation());
}

#[test]
fn test_stepError_fromHttpErrorWithoutMessage_shouldBecomeRequestFailed() {
    let error: StepError = TransportError::Http {
        status: 502,
        message: None,
    }
    .into();
    assert_eq!(error.to_string(), "Request failed");
}

#[test]
fn test_transportError_http_shouldDisplayStatusAndMessage() {
    let error = TransportError::Http {
        status: 429,
        message: Some("Too many requests".to_string()),
    };
    let display = error.to_string();
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_appError_fromPersistenceError_shouldWrapCorrectly() {
    let app_error: AppError = PersistenceError::Unavailable("disk full".to_string()).into();
    let display = app_error.to_string();
    assert!(display.contains("Persistence error"));
    assert!(display.contains("disk full"));
}

#[test]
fn test_appError_fromIoError_shouldWrapAsFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    let app_error: AppError = io_error.into();
    let display = app_error.to_string();
    assert!(display.contains("File error"));
    assert!(display.contains("File not found"));
}

#[test]
fn test_appError_fromAnyhow_shouldWrapAsUnknown() {
    let app_error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(app_error, AppError::Unknown(_)));
}
