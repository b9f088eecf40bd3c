//! User-facing copy for assessment failures
//!
//! Pure mapping from [`AssessmentError`] to display text. The match is
//! exhaustive on purpose: adding a taxonomy variant without copy for it
//! is a build error, not an "undefined" string at runtime.

use crate::error::AssessmentError;

/// Display-ready rendering of a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub title: String,
    pub body: String,
    pub guidance: Vec<String>,
    /// Whether a same-image retry action should be offered.
    pub retryable: bool,
}

/// Render a failure for display. No state, no side effects.
pub fn notice(error: &AssessmentError) -> ErrorNotice {
    match error {
        AssessmentError::Unauthenticated => ErrorNotice {
            title: "Session expired".into(),
            body: "You need to sign in again before submitting a photo.".into(),
            guidance: vec!["Sign in and restart the assessment.".into()],
            retryable: false,
        },
        AssessmentError::NoSubjectDetected { message, guidance } => ErrorNotice {
            title: "No pet detected".into(),
            body: message.clone(),
            guidance: vec![guidance.clone()],
            retryable: false,
        },
        AssessmentError::InvalidImage { message, guidance } => ErrorNotice {
            title: "Photo not usable".into(),
            body: message.clone(),
            guidance: vec![guidance.clone()],
            retryable: false,
        },
        AssessmentError::ServiceUnavailable { message, guidance } => ErrorNotice {
            title: "Analysis service unavailable".into(),
            body: message.clone(),
            guidance: vec![guidance.clone()],
            retryable: true,
        },
        AssessmentError::TransportFailure(_) => ErrorNotice {
            // The underlying message goes to the logs, not the user.
            title: "Connection problem".into(),
            body: "We couldn't reach the analysis service.".into(),
            guidance: vec![
                "Check your internet connection.".into(),
                "Retry with the same photo.".into(),
            ],
            retryable: true,
        },
        AssessmentError::Unknown(_) => ErrorNotice {
            title: "Something went wrong".into(),
            body: "The assessment could not be completed.".into(),
            guidance: vec!["Start over with a new photo.".into()],
            retryable: false,
        },
    }
}
