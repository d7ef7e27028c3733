//! Per-invocation scratch storage.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::HandlerConfig;
use crate::error::Result;

/// Name of the extraction directory inside the scratch directory.
const EXTRACT_DIR: &str = "artifact";

/// Scratch directory owned by one invocation.
///
/// Created under the configured scratch root and removed when dropped, so
/// every exit path of the workflow leaves nothing behind.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
    archive_path: PathBuf,
    extract_dir: PathBuf,
    template_path: PathBuf,
}

impl ScratchSpace {
    /// Create a fresh scratch directory for one invocation.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the scratch root cannot be created or written.
    pub fn create(config: &HandlerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.scratch_root)?;
        let dir = tempfile::Builder::new()
            .prefix("stagecheck-")
            .tempdir_in(&config.scratch_root)?;

        let archive_path = dir.path().join(&config.archive_name);
        let extract_dir = dir.path().join(EXTRACT_DIR);
        let template_path = extract_dir.join(&config.template_path);

        Ok(Self {
            dir,
            archive_path,
            extract_dir,
            template_path,
        })
    }

    /// Root of this invocation's scratch directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Where the downloaded archive is written.
    #[must_use]
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Directory the archive is extracted into.
    #[must_use]
    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Expected template location after extraction.
    #[must_use]
    pub fn template_path(&self) -> &Path {
        &self.template_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_follows_config() {
        let root = tempfile::tempdir().unwrap();
        let config = HandlerConfig {
            scratch_root: root.path().to_path_buf(),
            archive_name: "bundle.zip".to_string(),
            template_path: PathBuf::from("infra/stack.yml"),
        };

        let scratch = ScratchSpace::create(&config).unwrap();
        assert!(scratch.root().starts_with(root.path()));
        assert_eq!(scratch.archive_path(), scratch.root().join("bundle.zip"));
        assert_eq!(
            scratch.template_path(),
            scratch.extract_dir().join("infra/stack.yml")
        );
    }

    #[test]
    fn test_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let config = HandlerConfig::with_scratch_root(root.path().join("nested"));

        let scratch = ScratchSpace::create(&config).unwrap();
        let path = scratch.root().to_path_buf();
        std::fs::write(scratch.archive_path(), b"data").unwrap();
        assert!(path.exists());

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_invocations_are_isolated() {
        let root = tempfile::tempdir().unwrap();
        let config = HandlerConfig::with_scratch_root(root.path());

        let first = ScratchSpace::create(&config).unwrap();
        let second = ScratchSpace::create(&config).unwrap();
        assert_ne!(first.root(), second.root());
    }
}
