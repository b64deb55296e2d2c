use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{error::Error, types::SOURCE_FILE_NAME};

/// Isolated working directory for one compile request.
///
/// The directory lives under the system temp root, namespaced by a short
/// random identifier, and is removed when the session is dropped. Holding
/// the session across every exit path of a compile run is what guarantees
/// the cleanup invariant.
pub struct Session {
    /// Root directory for this session
    pub root_dir: PathBuf,
    /// Unique ID for this session
    id: String,
}

impl Session {
    /// Create a new session directory under the system temp root.
    pub async fn create() -> Result<Self, Error> {
        Self::create_with_id(short_id()).await
    }

    async fn create_with_id(id: String) -> Result<Self, Error> {
        let root_dir = std::env::temp_dir().join(format!("compile-{id}"));

        // An accidental name collision reuses the directory instead of
        // failing; uniqueness comes from the identifier's entropy.
        fs::create_dir_all(&root_dir).await?;

        debug!("created session directory {}", root_dir.display());
        Ok(Session { root_dir, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path of the fixed-name input file inside the session directory.
    pub fn source_path(&self) -> PathBuf {
        self.root_dir.join(SOURCE_FILE_NAME)
    }

    /// First direct entry whose file name ends with `.<extension>`, if
    /// any. Subdirectories are not descended into.
    pub async fn find_artifact(&self, extension: &str) -> Result<Option<PathBuf>, Error> {
        let suffix = format!(".{extension}");
        let mut entries = fs::read_dir(&self.root_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().ends_with(&suffix) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best-effort removal; a failure here is logged, never propagated.
        if let Err(e) = std::fs::remove_dir_all(&self.root_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(
                    "failed to clean up session directory {}: {}",
                    self.root_dir.display(),
                    e
                );
            }
        }
    }
}

fn short_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
