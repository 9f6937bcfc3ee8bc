use std::path::{Path, PathBuf};
use crate::store::{StoreError, StoreResult};

/// Longest file name most filesystems accept.
const MAX_FILE_NAME_BYTES: usize = 255;

const FILE_SUFFIX: &str = "_full.mp4";

/// A validated `(schema, worker_id)` pair.
///
/// Both components are safe to use as single path segments: they are
/// non-empty, hold no separators or control characters, and never start
/// with `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoKey {
    schema: String,
    worker_id: String,
}

impl VideoKey {
    pub fn new(schema: impl Into<String>, worker_id: impl Into<String>) -> StoreResult<Self> {
        let schema = schema.into();
        let worker_id = worker_id.into();
        check_component("schema", &schema)?;
        check_component("worker_id", &worker_id)?;

        let key = Self { schema, worker_id };
        if key.file_name().len() > MAX_FILE_NAME_BYTES {
            let field = if key.schema.len() >= key.worker_id.len() { "schema" } else { "worker_id" };
            return Err(StoreError::InvalidKey {
                field,
                reason: format!("file name would exceed {} bytes", MAX_FILE_NAME_BYTES),
            });
        }
        Ok(key)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// `{schema}_w_{worker_id}_full.mp4`
    pub fn file_name(&self) -> String {
        format!("{}_w_{}{}", self.schema, self.worker_id, FILE_SUFFIX)
    }

    /// Path of this video below `base_dir`.
    pub fn path_in(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.schema).join(self.file_name())
    }
}

fn check_component(field: &'static str, value: &str) -> StoreResult<()> {
    let reason = if value.is_empty() {
        "must not be empty"
    } else if value.starts_with('.') {
        "must not start with '.'"
    } else if value.contains(['/', '\\']) {
        "must not contain path separators"
    } else if value.chars().any(char::is_control) {
        "must not contain control characters"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidKey { field, reason: reason.to_string() })
}

/// Derives the storage path for a `(schema, worker_id)` pair.
///
/// Values that could escape `base_dir` are rejected rather than rewritten.
pub fn address_for(base_dir: &Path, schema: &str, worker_id: &str) -> StoreResult<PathBuf> {
    Ok(VideoKey::new(schema, worker_id)?.path_in(base_dir))
}

/// File name used both on disk and in download responses.
pub fn file_name_for(schema: &str, worker_id: &str) -> StoreResult<String> {
    Ok(VideoKey::new(schema, worker_id)?.file_name())
}
