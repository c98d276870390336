//! Per-submission scratch files
//!
//! Each submission gets its own directory named after the current time plus a
//! random suffix, so concurrent submissions never collide and no locking is
//! needed.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tracing::{debug, warn};

/// File name of the compiled executable inside the scratch directory
pub const BINARY_NAME: &str = "main";

/// Scratch directory holding one submission's source and build output
#[derive(Debug)]
pub struct ScratchArtifact {
    dir: TempDir,
    source_path: PathBuf,
    binary_path: PathBuf,
}

impl ScratchArtifact {
    /// Create the scratch directory under `root` and write the source file
    pub async fn create(root: &Path, source_file: &str, source_code: &str) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let dir = tempfile::Builder::new()
            .prefix(&format!("submission-{}-", stamp))
            .tempdir_in(root)?;

        let source_path = dir.path().join(source_file);
        tokio::fs::write(&source_path, source_code).await?;
        let binary_path = dir.path().join(BINARY_NAME);

        debug!("Created scratch directory {:?}", dir.path());

        Ok(Self {
            dir,
            source_path,
            binary_path,
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Remove `targets` and then the whole scratch directory.
    ///
    /// Failures are logged and otherwise ignored: they never change a verdict.
    pub async fn cleanup(self, targets: &[PathBuf]) {
        for path in targets {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {:?}: {}", path, e),
            }
        }

        let dir = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed scratch directory {:?}", dir),
            Err(e) => warn!("Failed to remove scratch directory {:?}: {}", dir, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_writes_source() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchArtifact::create(root.path(), "main.py", "print(1)")
            .await
            .unwrap();

        assert!(scratch.dir().starts_with(root.path()));
        assert_eq!(
            std::fs::read_to_string(scratch.source_path()).unwrap(),
            "print(1)"
        );
        assert_eq!(scratch.binary_path(), scratch.dir().join(BINARY_NAME));
        let name = scratch.dir().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("submission-"));
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchArtifact::create(root.path(), "main.c", "").await.unwrap();
        let b = ScratchArtifact::create(root.path(), "main.c", "").await.unwrap();
        assert_ne!(a.dir(), b.dir());
    }

    #[tokio::test]
    async fn test_cleanup_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchArtifact::create(root.path(), "main.c", "int main(){}")
            .await
            .unwrap();
        std::fs::write(scratch.binary_path(), b"\x7fELF").unwrap();
        let dir = scratch.dir().to_path_buf();
        let targets = vec![
            scratch.source_path().to_path_buf(),
            scratch.binary_path().to_path_buf(),
            dir.join("never-created"),
        ];

        scratch.cleanup(&targets).await;
        assert!(!dir.exists());
    }
}
