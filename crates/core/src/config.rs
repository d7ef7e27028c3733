//! Handler configuration.
//!
//! Scratch locations are passed into the workflow instead of being fixed
//! process-wide, so tests can point them at isolated directories.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Default file name for the downloaded archive.
pub const DEFAULT_ARCHIVE_NAME: &str = "merged.zip";

/// Default template path, relative to the extraction directory.
pub const DEFAULT_TEMPLATE_PATH: &str = "merged.yml";

/// Where the handler stages artifacts and which file it validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Directory under which each invocation creates its scratch directory
    pub scratch_root: PathBuf,
    /// File name of the downloaded archive inside the scratch directory
    pub archive_name: String,
    /// Template location relative to the extraction directory
    pub template_path: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
        }
    }
}

impl HandlerConfig {
    /// Create a configuration rooted at the given scratch directory.
    #[must_use]
    pub fn with_scratch_root(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            ..Self::default()
        }
    }

    /// Check that the scratch layout stays inside the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the offending field.
    pub fn validate(&self) -> Result<()> {
        let archive = Path::new(&self.archive_name);
        let mut components = archive.components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::config(format!(
                "archive name '{}' must be a plain file name",
                self.archive_name
            )));
        }

        if self.template_path.as_os_str().is_empty()
            || !self
                .template_path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::config(format!(
                "template path '{}' must be relative and stay inside the artifact",
                self.template_path.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_scratch_root_keeps_layout_defaults() {
        let config = HandlerConfig::with_scratch_root("/var/scratch");
        assert_eq!(config.scratch_root, PathBuf::from("/var/scratch"));
        assert_eq!(config.archive_name, DEFAULT_ARCHIVE_NAME);
        assert_eq!(config.template_path, PathBuf::from(DEFAULT_TEMPLATE_PATH));
    }

    #[test]
    fn test_nested_template_path_is_valid() {
        let config = HandlerConfig {
            template_path: PathBuf::from("./infra/stack.yaml"),
            ..HandlerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = HandlerConfig::default();
        assert_eq!(config.archive_name, "merged.zip");
        assert_eq!(config.template_path, PathBuf::from("merged.yml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_escaping_template_path() {
        let config = HandlerConfig {
            template_path: PathBuf::from("../etc/passwd"),
            ..HandlerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let config = HandlerConfig {
            template_path: PathBuf::from("/abs/merged.yml"),
            ..HandlerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nested_archive_name() {
        let config = HandlerConfig {
            archive_name: "nested/merged.zip".to_string(),
            ..HandlerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = HandlerConfig {
            archive_name: "..".to_string(),
            ..HandlerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
