//! Result handoff to the display layer
//!
//! The pipeline resolves every attempt through exactly one of these two
//! calls. Both carry the original [`ImageRef`]: the error path keeps it
//! so a retry UI can re-offer the same photo without the user picking
//! again.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::acquire::ImageRef;
use crate::api::PainAssessment;
use crate::error::AssessmentError;

/// Receiver of terminal attempt outcomes.
#[async_trait]
pub trait ResultHandoff: Send + Sync {
    /// A payload arrived; the result screen takes over.
    async fn on_success(&self, payload: &PainAssessment, image: &ImageRef);

    /// The attempt failed; the error screen takes over. The image is
    /// retained for the retry affordance.
    async fn on_error(&self, error: &AssessmentError, image: &ImageRef);
}

/// Handoff that logs outcomes, used where no UI is attached.
#[derive(Default)]
pub struct LogHandoff;

impl LogHandoff {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResultHandoff for LogHandoff {
    async fn on_success(&self, payload: &PainAssessment, image: &ImageRef) {
        info!(
            pain_level = %payload.pain_level,
            confidence = payload.confidence,
            image = %image.uri().display(),
            "assessment complete"
        );
    }

    async fn on_error(&self, error: &AssessmentError, image: &ImageRef) {
        warn!(
            %error,
            retryable = error.retryable(),
            image = %image.uri().display(),
            "assessment failed"
        );
    }
}

/// One recorded handoff call.
#[derive(Debug, Clone, PartialEq)]
pub enum Handoff {
    Success {
        payload: PainAssessment,
        image: ImageRef,
    },
    Error {
        error: AssessmentError,
        image: ImageRef,
    },
}

/// Handoff that records every call, for tests.
#[derive(Default)]
pub struct RecordingHandoff {
    calls: Mutex<Vec<Handoff>>,
}

impl RecordingHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<Handoff> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultHandoff for RecordingHandoff {
    async fn on_success(&self, payload: &PainAssessment, image: &ImageRef) {
        self.calls.lock().unwrap().push(Handoff::Success {
            payload: payload.clone(),
            image: image.clone(),
        });
    }

    async fn on_error(&self, error: &AssessmentError, image: &ImageRef) {
        self.calls.lock().unwrap().push(Handoff::Error {
            error: error.clone(),
            image: image.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> PainAssessment {
        PainAssessment {
            pain_level: "mild".into(),
            confidence: 0.8,
            extra: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn recording_handoff_keeps_call_order() {
        let handoff = RecordingHandoff::new();
        let image = ImageRef::new("/tmp/cat.jpg");

        handoff
            .on_error(&AssessmentError::Unauthenticated, &image)
            .await;
        handoff.on_success(&payload(), &image).await;

        let calls = handoff.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Handoff::Error { .. }));
        assert!(matches!(calls[1], Handoff::Success { .. }));
    }

    #[tokio::test]
    async fn error_handoff_retains_the_image() {
        let handoff = RecordingHandoff::new();
        let image = ImageRef::new("/tmp/cat.jpg");

        handoff
            .on_error(&AssessmentError::TransportFailure("timeout".into()), &image)
            .await;

        match &handoff.calls()[0] {
            Handoff::Error { image: kept, .. } => assert_eq!(kept, &image),
            other => panic!("unexpected handoff: {other:?}"),
        }
    }
}
