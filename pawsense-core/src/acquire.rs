//! Image acquisition
//!
//! Obtains a local image handle from the camera or the photo library,
//! subject to runtime permission checks. The picker is a trait so the
//! platform integration (or a test double) can be injected; `acquire`
//! implements the shared check-then-prompt logic.
//!
//! The returned [`ImageRef`] is a stable handle to the original bytes.
//! Nothing in this crate copies, resizes or re-encodes the image; any
//! transformation (crop, rotate) happens in the acquisition UI before the
//! reference is handed over.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::AcquireError;

/// Where the image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Library,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => write!(f, "camera"),
            Self::Library => write!(f, "photo library"),
        }
    }
}

/// Runtime permission state for an image source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
}

/// Opaque handle to local image bytes.
///
/// The underlying file is owned by the acquisition layer and treated as
/// immutable; both an initial submit and a later retry read the same
/// bytes through the same handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    uri: PathBuf,
}

impl ImageRef {
    /// Wrap a local URI.
    pub fn new(uri: impl Into<PathBuf>) -> Self {
        Self { uri: uri.into() }
    }

    /// The local URI of the image.
    pub fn uri(&self) -> &Path {
        &self.uri
    }

    /// File name component, for the multipart upload part.
    pub fn file_name(&self) -> String {
        self.uri
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string())
    }

    /// Read the image bytes. Never mutates the underlying file.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.uri).await
    }
}

/// Platform hook for permission checks and the picker UI.
#[async_trait]
pub trait ImagePicker: Send + Sync {
    /// Current permission state, without prompting.
    async fn permission(&self, source: ImageSource) -> Permission;

    /// Prompt the user for permission. Only called when the current state
    /// is undetermined.
    async fn request_permission(&self, source: ImageSource) -> Permission;

    /// Present the picker. `Ok(None)` means the user cancelled.
    async fn pick(&self, source: ImageSource) -> Result<Option<ImageRef>, AcquireError>;
}

/// Obtain an image from the given source.
///
/// Checks the current permission state first and only prompts when it is
/// undetermined, so an already-granted (or already-denied) permission
/// never produces a redundant dialog. Denial is an error, distinct from
/// the user cancelling the picker (`Ok(None)`).
pub async fn acquire(
    picker: &dyn ImagePicker,
    source: ImageSource,
) -> Result<Option<ImageRef>, AcquireError> {
    match picker.permission(source).await {
        Permission::Granted => {}
        Permission::Denied => return Err(AcquireError::PermissionDenied(source)),
        Permission::Undetermined => {
            debug!(%source, "requesting image permission");
            if picker.request_permission(source).await != Permission::Granted {
                return Err(AcquireError::PermissionDenied(source));
            }
        }
    }
    picker.pick(source).await
}

/// Picker backed by a fixed file path, for headless use (CLI, tests).
///
/// Permissions are always granted; picking fails if the file is missing.
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    /// Create a picker that always returns the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImagePicker for PathPicker {
    async fn permission(&self, _source: ImageSource) -> Permission {
        Permission::Granted
    }

    async fn request_permission(&self, _source: ImageSource) -> Permission {
        Permission::Granted
    }

    async fn pick(&self, _source: ImageSource) -> Result<Option<ImageRef>, AcquireError> {
        if !self.path.exists() {
            return Err(AcquireError::Unavailable(format!(
                "no such file: {}",
                self.path.display()
            )));
        }
        Ok(Some(ImageRef::new(&self.path)))
    }
}
