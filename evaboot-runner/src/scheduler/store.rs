//! Cursor persistence
//!
//! Keeps a trigger's [`PollCursor`] in a JSON file so a restarted runner
//! does not re-emit jobs it already delivered.

use anyhow::{Context, Result};
use evaboot_core::domain::cursor::PollCursor;
use std::path::{Path, PathBuf};

/// JSON file holding one trigger's cursor
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored cursor, or `None` if the trigger never ran
    pub async fn load(&self) -> Result<Option<PollCursor>> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let cursor = serde_json::from_slice(&contents)
            .with_context(|| format!("Failed to parse cursor in {}", self.path.display()))?;
        Ok(Some(cursor))
    }

    /// Writes the cursor, replacing the previous file atomically
    pub async fn save(&self, cursor: &PollCursor) -> Result<()> {
        let contents = serde_json::to_vec_pretty(cursor).context("Failed to encode cursor")?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}
