//! Pain-assessment submission core for pawsense.
//!
//! This crate is the one stateful part of the client: the pipeline that
//! takes a pet photo, uploads it to the remote inference service, drives
//! a multi-stage progress UI, classifies the service's error taxonomy and
//! supports a bounded same-image retry. Everything around it (screens,
//! navigation, session storage) talks to the core through small traits.
//!
//! # Architecture
//!
//! ```text
//! ImageAcquisition ──▶ SubmissionPipeline ──▶ ResultHandoff
//!                          │        │
//!            AssessmentContextStore │
//!                                   ▼
//!                        AuthenticatedTransport ──▶ POST /predict-eld
//! ```

pub mod acquire;
pub mod api;
pub mod context;
pub mod error;
pub mod handoff;
pub mod pipeline;
pub mod present;
pub mod transport;

pub use acquire::{ImageRef, ImageSource, Permission};
pub use api::PainAssessment;
pub use context::{AssessmentContext, Registration, SubjectKind};
pub use error::{AssessmentError, PipelineError, Result};
pub use pipeline::{AttemptOutcome, Progress, Stage, SubmissionPipeline};
pub use present::{ErrorNotice, notice};
