use std::path::{Path, PathBuf};

use platform_authn::random_hex;

use crate::HrResult;

/// An uploaded photo as received from the form.
#[derive(Clone, Debug)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Employee photos live as plain files in one directory; the employee row
/// keeps only the file name.
#[derive(Clone, Debug)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub async fn ensure_dir(&self) -> HrResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Writes the upload as `<code>_<12 hex>_<original>` and returns the
    /// stored name.
    pub async fn save(&self, emp_code: &str, upload: &PhotoUpload) -> HrResult<String> {
        self.ensure_dir().await?;
        let name = sanitize_file_name(&format!(
            "{}_{}_{}",
            emp_code,
            random_hex(6),
            upload.file_name
        ));
        tokio::fs::write(self.path_of(&name), &upload.bytes).await?;
        tracing::debug!(file = %name, bytes = upload.bytes.len(), "photo stored");
        Ok(name)
    }

    /// Best effort: a missing file is fine, other failures are logged.
    pub async fn remove(&self, name: &str) {
        let path = self.path_of(&sanitize_file_name(name));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(file = %name, "photo removed"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(file = %name, error = %err, "photo removal failed"),
        }
    }
}

/// Reduces an arbitrary client file name to ASCII letters, digits, `_`, `.`
/// and `-` with no directory components.
pub fn sanitize_file_name(name: &str) -> String {
    let flattened = name.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "photo".to_string()
    } else {
        trimmed.to_string()
    }
}
