//! Authenticated transport to the inference backend
//!
//! Wraps the upload call with a bearer token fetched from the session
//! layer. If no token is present the call fails fast with
//! `TransportError::Unauthenticated` and no network I/O happens.
//!
//! The Content-Type header is never set manually: reqwest computes the
//! multipart boundary, and overriding the header would break the body.

pub mod mock;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use tracing::{debug, warn};

use crate::acquire::ImageRef;
use crate::error::TransportError;

pub use mock::MockTransport;

/// Endpoint of the landmark-based inference model.
const PREDICT_PATH: &str = "/predict-eld";

/// Default bound on the whole upload call.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Read access to the session layer's auth token.
///
/// Token storage mechanics live outside this crate; the pipeline only
/// needs to know whether a token exists and what to attach.
#[async_trait]
pub trait SessionTokens: Send + Sync {
    /// The current bearer token, if a session is active.
    async fn auth_token(&self) -> Option<String>;
}

/// Fixed token source, for the CLI and tests.
pub struct StaticTokens {
    token: Option<String>,
}

impl StaticTokens {
    /// A source that always yields the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A source with no session.
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl SessionTokens for StaticTokens {
    async fn auth_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Raw HTTP reply, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Upload seam between the pipeline and the backend.
///
/// The real implementation is [`AuthenticatedTransport`]; tests script
/// replies through [`MockTransport`].
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Upload the image and return the raw reply.
    async fn upload(&self, image: &ImageRef) -> Result<HttpReply, TransportError>;
}

/// reqwest-backed transport with bearer auth and a bounded timeout.
pub struct AuthenticatedTransport {
    base_url: String,
    client: reqwest::Client,
    tokens: Arc<dyn SessionTokens>,
}

impl AuthenticatedTransport {
    /// Create a transport with the default upload timeout.
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn SessionTokens>,
    ) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, tokens, DEFAULT_UPLOAD_TIMEOUT)
    }

    /// Create a transport with a custom upload timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        tokens: Arc<dyn SessionTokens>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            tokens,
        })
    }

    /// Base URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl InferenceTransport for AuthenticatedTransport {
    async fn upload(&self, image: &ImageRef) -> Result<HttpReply, TransportError> {
        let Some(token) = self.tokens.auth_token().await else {
            warn!("upload requested without a session token");
            return Err(TransportError::Unauthenticated);
        };

        let bytes = image
            .read_bytes()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read image: {e}")))?;
        let part = multipart::Part::bytes(bytes).file_name(image.file_name());
        let form = multipart::Form::new().part("file", part);

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), PREDICT_PATH);
        debug!(%url, image = %image.uri().display(), "uploading image");

        // Content-Type is left to reqwest so the multipart boundary stays
        // consistent with the encoded body.
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        debug!(status, body_len = body.len(), "inference reply received");
        Ok(HttpReply { status, body })
    }
}
