//! Mock transport for testing
//!
//! Scripts replies for the pipeline the way a unit test needs them: queue
//! results with `queue_reply`/`queue_failure` before submitting. Each
//! upload consumes one queued result and records the exact bytes read
//! from the image, so tests can assert that a retry re-sends identical
//! content.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{HttpReply, InferenceTransport};
use crate::acquire::ImageRef;
use crate::error::TransportError;

/// Scriptable implementation of [`InferenceTransport`].
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    uploads: Mutex<Vec<Vec<u8>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Create a mock with no queued replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that sleeps before answering, for in-flight tests.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Queue a reply for the next upload.
    pub fn queue_reply(&self, status: u16, body: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(HttpReply {
            status,
            body: body.into(),
        }));
    }

    /// Queue a transport-level failure for the next upload.
    pub fn queue_failure(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Number of uploads performed so far.
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    /// Bytes read from the image for each upload, in call order.
    pub fn uploaded_bytes(&self) -> Vec<Vec<u8>> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceTransport for MockTransport {
    async fn upload(&self, image: &ImageRef) -> Result<HttpReply, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let bytes = image
            .read_bytes()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read image: {e}")))?;
        self.uploads.lock().unwrap().push(bytes);

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(TransportError::Network(
                "no queued reply in MockTransport".to_string(),
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_image(bytes: &[u8]) -> (tempfile::TempDir, ImageRef) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        tokio::fs::write(&path, bytes).await.unwrap();
        (dir, ImageRef::new(path))
    }

    #[tokio::test]
    async fn upload_consumes_queued_replies_in_order() {
        let (_dir, image) = temp_image(b"bytes").await;
        let mock = MockTransport::new();
        mock.queue_reply(200, "first");
        mock.queue_reply(503, "second");

        let first = mock.upload(&image).await.unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.body, "first");

        let second = mock.upload(&image).await.unwrap();
        assert_eq!(second.status, 503);
    }

    #[tokio::test]
    async fn upload_records_image_bytes() {
        let (_dir, image) = temp_image(b"exact content").await;
        let mock = MockTransport::new();
        mock.queue_reply(200, "{}");

        mock.upload(&image).await.unwrap();

        assert_eq!(mock.upload_count(), 1);
        assert_eq!(mock.uploaded_bytes()[0], b"exact content");
    }

    #[tokio::test]
    async fn upload_without_queued_reply_fails() {
        let (_dir, image) = temp_image(b"bytes").await;
        let mock = MockTransport::new();

        let result = mock.upload(&image).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }

    #[tokio::test]
    async fn queued_failures_are_returned() {
        let (_dir, image) = temp_image(b"bytes").await;
        let mock = MockTransport::new();
        mock.queue_failure(TransportError::Network("timeout".into()));

        let result = mock.upload(&image).await;
        assert_eq!(result, Err(TransportError::Network("timeout".into())));
    }
}
