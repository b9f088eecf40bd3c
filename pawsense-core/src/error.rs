//! Error types for pawsense-core
//!
//! `AssessmentError` is the taxonomy every failed attempt resolves to and
//! is what `present::notice` renders. `PipelineError` covers misuse of the
//! pipeline itself (busy, bad retry, species mismatch) and is reported to
//! the caller before any attempt runs.

use thiserror::Error;

use crate::acquire::ImageSource;
use crate::context::SubjectKind;

/// Result type alias using the crate's assessment error.
pub type Result<T> = std::result::Result<T, AssessmentError>;

/// Terminal failure of a submission attempt.
///
/// Every failed attempt carries exactly one of these variants. Only
/// `ServiceUnavailable` and `TransportFailure` permit a same-image retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssessmentError {
    /// No valid session token available locally; no request was made.
    #[error("no valid session token available")]
    Unauthenticated,

    /// The service found no qualifying subject in the photo.
    #[error("no subject detected: {message}")]
    NoSubjectDetected { message: String, guidance: String },

    /// The service rejected the photo for a reason other than detection.
    #[error("image rejected: {message}")]
    InvalidImage { message: String, guidance: String },

    /// The inference dependency is down; retryable.
    #[error("analysis service unavailable: {message}")]
    ServiceUnavailable { message: String, guidance: String },

    /// Network-level failure (timeout, DNS, reset); retryable.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Anything that matched no other variant.
    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl AssessmentError {
    /// Whether a same-image retry is offered for this failure.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable { .. } | Self::TransportFailure(_)
        )
    }
}

impl From<TransportError> for AssessmentError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unauthenticated => Self::Unauthenticated,
            TransportError::Network(message) => Self::TransportFailure(message),
        }
    }
}

/// Errors from the authenticated transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No session token present; the request was never sent.
    #[error("no session token available")]
    Unauthenticated,

    /// The request failed below HTTP (connect, timeout, read).
    #[error("network failure: {0}")]
    Network(String),
}

/// Misuse of the submission pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// An attempt is already in flight; submit/retry are never interleaved.
    #[error("a submission attempt is already in flight")]
    Busy,

    /// The species hint or stored context disagrees with the active flow.
    /// Raised before any network call is made.
    #[error("species mismatch: this flow analyzes {expected} photos, got {actual:?}")]
    SpeciesMismatch {
        expected: SubjectKind,
        actual: String,
    },

    /// `retry()` called after a non-retryable failure.
    #[error("last attempt is not retryable: {last}")]
    RetryNotAllowed { last: String },

    /// `retry()` called with no failed attempt on record.
    #[error("no failed attempt to retry")]
    NothingToRetry,
}

/// Errors from image acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// The user denied the runtime permission. Distinct from cancellation,
    /// which is reported as `Ok(None)`.
    #[error("permission denied for {0}")]
    PermissionDenied(ImageSource),

    /// The source could not produce an image (missing file, device error).
    #[error("image source unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the persisted assessment context store.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read assessment context: {0}")]
    Read(String),

    #[error("failed to write assessment context: {0}")]
    Write(String),
}
