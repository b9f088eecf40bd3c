//! Assessment context persistence
//!
//! The context is a single JSON blob under a well-known file name. The
//! store is injected into the pipeline so the core is testable without a
//! real storage backend.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;

use super::AssessmentContext;
use crate::error::ContextError;

/// Context file name under the app's config directory.
const CONTEXT_FILE: &str = "assessment_context.json";

/// Storage for the in-progress assessment context.
///
/// The submission pipeline only calls `get`; `set` exists for the
/// surrounding app (and the CLI) which own the context's lifecycle.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Read the persisted context, if one exists.
    async fn get(&self) -> Result<Option<AssessmentContext>, ContextError>;

    /// Replace the persisted context.
    async fn set(&self, context: AssessmentContext) -> Result<(), ContextError>;
}

/// File-backed context store.
pub struct FileContextStore {
    file_path: PathBuf,
}

impl FileContextStore {
    /// Create a store rooted at the given config directory.
    pub fn new(config_dir: &Path) -> Self {
        Self {
            file_path: config_dir.join(CONTEXT_FILE),
        }
    }

    /// Path of the backing file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

#[async_trait]
impl ContextStore for FileContextStore {
    async fn get(&self) -> Result<Option<AssessmentContext>, ContextError> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.file_path)
            .await
            .map_err(|e| ContextError::Read(e.to_string()))?;
        let context =
            serde_json::from_str(&content).map_err(|e| ContextError::Read(e.to_string()))?;
        Ok(Some(context))
    }

    async fn set(&self, context: AssessmentContext) -> Result<(), ContextError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ContextError::Write(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&context)
            .map_err(|e| ContextError::Write(e.to_string()))?;
        fs::write(&self.file_path, content)
            .await
            .map_err(|e| ContextError::Write(e.to_string()))?;
        Ok(())
    }
}

/// In-memory context store for tests and previews.
#[derive(Default)]
pub struct MemoryContextStore {
    context: Mutex<Option<AssessmentContext>>,
}

impl MemoryContextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a context.
    pub fn with_context(context: AssessmentContext) -> Self {
        Self {
            context: Mutex::new(Some(context)),
        }
    }
}

#[async_trait]
impl ContextStore for MemoryContextStore {
    async fn get(&self) -> Result<Option<AssessmentContext>, ContextError> {
        Ok(self.context.lock().unwrap().clone())
    }

    async fn set(&self, context: AssessmentContext) -> Result<(), ContextError> {
        *self.context.lock().unwrap() = Some(context);
        Ok(())
    }
}
