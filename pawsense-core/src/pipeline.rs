//! Submission pipeline state machine
//!
//! One attempt runs `Preparing → Uploading → Analyzing → Processing →
//! Complete`, with `Errored` reachable from the first three. Progress is
//! published on a broadcast channel before the next transition begins, so
//! observers see every intermediate stage in order. A screen that goes
//! away simply drops its receiver; an abandoned in-flight attempt then
//! publishes into the void instead of mutating dead UI state.
//!
//! Retry state is pipeline-owned: the last submitted image and the last
//! failure live here, not in any UI component, so `retry()` is a pure
//! pipeline operation bound to the same bytes as the original submit.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::acquire::ImageRef;
use crate::api::{self, PainAssessment};
use crate::context::{ContextStore, SubjectKind};
use crate::error::{AssessmentError, PipelineError};
use crate::handoff::ResultHandoff;
use crate::transport::{InferenceTransport, SessionTokens};

/// Stage of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// No attempt has started.
    Idle,
    /// Attempt created, checking the session.
    Preparing,
    /// Multipart upload in flight.
    Uploading,
    /// Reply received, interpreting the body.
    Analyzing,
    /// Payload accepted, result screen about to take over.
    Processing,
    /// Terminal: payload handed off.
    Complete,
    /// Terminal: failure handed off.
    Errored,
}

/// Progress update for UI binding.
///
/// Percentages are advisory pacing signals; the contract is that they
/// never decrease within an attempt and that a terminal stage is reached
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub stage: Stage,
    pub percent: u8,
}

/// Resolution of one attempt. Exactly one per submit/retry call.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(PainAssessment),
    Failed(AssessmentError),
}

impl AttemptOutcome {
    /// The failure, if the attempt failed.
    pub fn failure(&self) -> Option<&AssessmentError> {
        match self {
            Self::Success(_) => None,
            Self::Failed(error) => Some(error),
        }
    }
}

const PREPARING_PERCENT: u8 = 0;
const UPLOADING_PERCENT: u8 = 20;
const ANALYZING_PERCENT: u8 = 70;
const PROCESSING_PERCENT: u8 = 90;
const COMPLETE_PERCENT: u8 = 100;

/// Brief pause before `Complete`, so the final stage is visible.
const RESULT_PACING: Duration = Duration::from_millis(150);

/// Retry state of the previous attempt.
#[derive(Default)]
struct LastAttempt {
    image: Option<ImageRef>,
    failure: Option<AssessmentError>,
}

/// Orchestrates upload, classification, progress and retry for one flow.
///
/// At most one attempt is live per pipeline instance; a second `submit`
/// or `retry` while one is in flight fails with [`PipelineError::Busy`].
pub struct SubmissionPipeline {
    /// Subject kind this flow analyzes; uploads for the other kind are
    /// rejected before any network call.
    flow: SubjectKind,
    tokens: Arc<dyn SessionTokens>,
    transport: Arc<dyn InferenceTransport>,
    context: Arc<dyn ContextStore>,
    handoff: Arc<dyn ResultHandoff>,
    progress: broadcast::Sender<Progress>,
    flight: tokio::sync::Mutex<()>,
    last: Mutex<LastAttempt>,
}

impl SubmissionPipeline {
    /// Create a pipeline for the given flow.
    pub fn new(
        flow: SubjectKind,
        tokens: Arc<dyn SessionTokens>,
        transport: Arc<dyn InferenceTransport>,
        context: Arc<dyn ContextStore>,
        handoff: Arc<dyn ResultHandoff>,
    ) -> Self {
        let (progress, _) = broadcast::channel(64);
        Self {
            flow,
            tokens,
            transport,
            context,
            handoff,
            progress,
            flight: tokio::sync::Mutex::new(()),
            last: Mutex::new(LastAttempt::default()),
        }
    }

    /// Subject kind of the active flow.
    pub fn flow(&self) -> SubjectKind {
        self.flow
    }

    /// Subscribe to progress updates from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Submit an image for assessment.
    ///
    /// The species hint must resolve to this flow's kind, and the stored
    /// assessment context (when present) must agree; otherwise the call
    /// fails with `SpeciesMismatch` before any network I/O. Resolves
    /// exactly once with the attempt's outcome.
    pub async fn submit(
        &self,
        image: ImageRef,
        species_hint: &str,
    ) -> Result<AttemptOutcome, PipelineError> {
        let _flight = self.flight.try_lock().map_err(|_| PipelineError::Busy)?;
        self.check_species(species_hint).await?;
        self.last.lock().unwrap().image = Some(image.clone());
        Ok(self.run_attempt(image).await)
    }

    /// Re-run the last failed attempt with the same image.
    ///
    /// Only permitted after a retryable failure (`ServiceUnavailable` or
    /// `TransportFailure`); anything else is a caller bug and fails
    /// loudly rather than silently doing nothing.
    pub async fn retry(&self) -> Result<AttemptOutcome, PipelineError> {
        let _flight = self.flight.try_lock().map_err(|_| PipelineError::Busy)?;
        let image = {
            let last = self.last.lock().unwrap();
            match &last.failure {
                None => return Err(PipelineError::NothingToRetry),
                Some(failure) if !failure.retryable() => {
                    return Err(PipelineError::RetryNotAllowed {
                        last: failure.to_string(),
                    });
                }
                Some(_) => last.image.clone().ok_or(PipelineError::NothingToRetry)?,
            }
        };
        debug!(image = %image.uri().display(), "retrying with last submitted image");
        Ok(self.run_attempt(image).await)
    }

    /// Validate hint and stored context against the flow's kind.
    async fn check_species(&self, hint: &str) -> Result<(), PipelineError> {
        let Some(kind) = SubjectKind::from_hint(hint) else {
            return Err(PipelineError::SpeciesMismatch {
                expected: self.flow,
                actual: hint.to_string(),
            });
        };
        if kind != self.flow {
            return Err(PipelineError::SpeciesMismatch {
                expected: self.flow,
                actual: kind.to_string(),
            });
        }
        match self.context.get().await {
            Ok(Some(ctx)) if ctx.subject_kind != self.flow => {
                Err(PipelineError::SpeciesMismatch {
                    expected: self.flow,
                    actual: ctx.subject_kind.to_string(),
                })
            }
            Ok(_) => Ok(()),
            Err(error) => {
                // Missing or unreadable context only disables the
                // consistency check; the hint has already been validated.
                warn!(%error, "could not read assessment context");
                Ok(())
            }
        }
    }

    /// Run one attempt from `Preparing` to a terminal stage.
    async fn run_attempt(&self, image: ImageRef) -> AttemptOutcome {
        self.publish(Stage::Preparing, PREPARING_PERCENT);

        if self.tokens.auth_token().await.is_none() {
            return self
                .fail(AssessmentError::Unauthenticated, &image, PREPARING_PERCENT)
                .await;
        }

        self.publish(Stage::Uploading, UPLOADING_PERCENT);
        let reply = match self.transport.upload(&image).await {
            Ok(reply) => reply,
            Err(error) => return self.fail(error.into(), &image, UPLOADING_PERCENT).await,
        };

        let mut percent = UPLOADING_PERCENT;
        if (200..300).contains(&reply.status) {
            percent = ANALYZING_PERCENT;
            self.publish(Stage::Analyzing, percent);
        }

        match api::classify(reply.status, &reply.body) {
            Ok(payload) => {
                self.publish(Stage::Processing, PROCESSING_PERCENT);
                // UX pacing, not a correctness requirement.
                tokio::time::sleep(RESULT_PACING).await;
                self.publish(Stage::Complete, COMPLETE_PERCENT);
                self.last.lock().unwrap().failure = None;
                self.handoff.on_success(&payload, &image).await;
                AttemptOutcome::Success(payload)
            }
            Err(detail) => self.fail(detail, &image, percent).await,
        }
    }

    async fn fail(
        &self,
        error: AssessmentError,
        image: &ImageRef,
        percent: u8,
    ) -> AttemptOutcome {
        warn!(%error, retryable = error.retryable(), "submission attempt failed");
        self.publish(Stage::Errored, percent);
        self.last.lock().unwrap().failure = Some(error.clone());
        self.handoff.on_error(&error, image).await;
        AttemptOutcome::Failed(error)
    }

    fn publish(&self, stage: Stage, percent: u8) {
        debug!(?stage, percent, "progress");
        // No receivers just means nobody is watching anymore.
        let _ = self.progress.send(Progress { stage, percent });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryContextStore;
    use crate::handoff::RecordingHandoff;
    use crate::transport::{MockTransport, StaticTokens};

    fn pipeline_with(
        flow: SubjectKind,
        transport: Arc<MockTransport>,
    ) -> SubmissionPipeline {
        SubmissionPipeline::new(
            flow,
            Arc::new(StaticTokens::new("tok")),
            transport,
            Arc::new(MemoryContextStore::new()),
            Arc::new(RecordingHandoff::new()),
        )
    }

    #[tokio::test]
    async fn unrecognized_hint_is_rejected_before_upload() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline_with(SubjectKind::Feline, transport.clone());

        let result = pipeline
            .submit(ImageRef::new("/tmp/bird.jpg"), "parrot")
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::SpeciesMismatch { .. })
        ));
        assert_eq!(transport.upload_count(), 0);
    }

    #[tokio::test]
    async fn wrong_kind_hint_is_rejected_before_upload() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline_with(SubjectKind::Feline, transport.clone());

        let result = pipeline.submit(ImageRef::new("/tmp/dog.jpg"), "dog").await;

        assert!(matches!(
            result,
            Err(PipelineError::SpeciesMismatch {
                expected: SubjectKind::Feline,
                ..
            })
        ));
        assert_eq!(transport.upload_count(), 0);
    }

    #[tokio::test]
    async fn retry_without_prior_attempt_fails_loudly() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline_with(SubjectKind::Canine, transport);

        let result = pipeline.retry().await;
        assert!(matches!(result, Err(PipelineError::NothingToRetry)));
    }

    #[test]
    fn outcome_failure_accessor() {
        let failed = AttemptOutcome::Failed(AssessmentError::Unauthenticated);
        assert_eq!(failed.failure(), Some(&AssessmentError::Unauthenticated));

        let ok = AttemptOutcome::Success(PainAssessment {
            pain_level: "mild".into(),
            confidence: 0.8,
            extra: serde_json::Map::new(),
        });
        assert!(ok.failure().is_none());
    }
}
