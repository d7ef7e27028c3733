//! Error types for the validation workflow.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using the stagecheck error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
///
/// Transport and data errors end the workflow with a failure signal.
/// Reporting errors have no channel left to report through and propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A network call to storage or the validation service failed.
    Transport,
    /// The event, archive, or template was unusable, or local scratch IO failed.
    Data,
    /// The terminal signal to the orchestrator could not be delivered.
    Reporting,
    /// A fault inside the handler itself.
    Internal,
}

/// Errors that can occur while handling a pipeline job.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The invocation payload is not a well-formed pipeline job event.
    #[error("Malformed pipeline event: {message}")]
    #[diagnostic(
        code(stagecheck::invalid_event),
        help("The function expects the CodePipeline job invoke event")
    )]
    InvalidEvent {
        /// What the event parser reported
        message: String,
    },

    /// The event carried no usable artifact credentials.
    #[error("Artifact credentials are missing or incomplete: {missing}")]
    #[diagnostic(
        code(stagecheck::invalid_credentials),
        help("The pipeline supplies accessKeyId, secretAccessKey and sessionToken for every job")
    )]
    InvalidCredentials {
        /// Comma separated list of the missing credential fields
        missing: String,
    },

    /// The event did not reference exactly one input artifact.
    #[error("Expected exactly one input artifact, found {count}")]
    #[diagnostic(
        code(stagecheck::artifact_count),
        help("Configure the pipeline action with a single input artifact")
    )]
    ArtifactCount {
        /// Number of input artifacts present in the event
        count: usize,
    },

    /// The input artifact has no usable S3 location.
    #[error("Input artifact '{artifact}' has no S3 location")]
    #[diagnostic(code(stagecheck::artifact_location))]
    ArtifactLocation {
        /// Artifact name as given by the pipeline
        artifact: String,
    },

    /// Downloading the artifact from object storage failed.
    #[error("Failed to download s3://{bucket}/{key}: {message}")]
    #[diagnostic(code(stagecheck::download_failed))]
    Download {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Error message from the storage client
        message: String,
    },

    /// The downloaded archive could not be read or extracted.
    #[error("Failed to extract archive {}: {message}", archive.display())]
    #[diagnostic(code(stagecheck::archive_invalid))]
    Archive {
        /// Archive path on scratch storage
        archive: PathBuf,
        /// What went wrong
        message: String,
    },

    /// The extracted artifact did not contain the template.
    #[error("Template not found at {}", path.display())]
    #[diagnostic(
        code(stagecheck::template_missing),
        help("Check that the build stage packages the template under the configured path")
    )]
    TemplateMissing {
        /// Expected template path
        path: PathBuf,
    },

    /// The template is not valid UTF-8 text.
    #[error("Template at {} is not valid UTF-8", path.display())]
    #[diagnostic(code(stagecheck::template_encoding))]
    TemplateEncoding {
        /// Template path
        path: PathBuf,
    },

    /// The validation service rejected the template or could not be reached.
    #[error("Template validation failed: {message}")]
    #[diagnostic(code(stagecheck::validation_failed))]
    Validation {
        /// Error message from the validation service
        message: String,
        /// Whether the service answered (template rejected) rather than the call failing
        rejected: bool,
    },

    /// The success or failure signal could not be delivered.
    #[error("Failed to report job {job_id} result: {message}")]
    #[diagnostic(code(stagecheck::report_failed))]
    Report {
        /// Pipeline job identifier
        job_id: String,
        /// Error message from the orchestrator client
        message: String,
    },

    /// Handler configuration is invalid.
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(stagecheck::invalid_config))]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// The workflow panicked.
    #[error("Handler fault: {message}")]
    #[diagnostic(code(stagecheck::fault))]
    Fault {
        /// Panic payload or join error text
        message: String,
    },

    /// Local filesystem error on scratch storage.
    #[error("IO error: {0}")]
    #[diagnostic(code(stagecheck::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an error for an event that could not be parsed.
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an archive error for the given archive path.
    pub fn archive(archive: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Archive {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for a template the service rejected.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            rejected: true,
        }
    }

    /// Create a validation error for a call that never got an answer.
    pub fn validation_transport(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            rejected: false,
        }
    }

    /// Create a fault error.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Download { .. } => ErrorCategory::Transport,
            Self::Validation { rejected, .. } => {
                if *rejected {
                    ErrorCategory::Data
                } else {
                    ErrorCategory::Transport
                }
            }
            Self::InvalidEvent { .. }
            | Self::InvalidCredentials { .. }
            | Self::ArtifactCount { .. }
            | Self::ArtifactLocation { .. }
            | Self::Archive { .. }
            | Self::TemplateMissing { .. }
            | Self::TemplateEncoding { .. }
            | Self::InvalidConfig { .. }
            | Self::Io(_) => ErrorCategory::Data,
            Self::Report { .. } => ErrorCategory::Reporting,
            Self::Fault { .. } => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let download = Error::Download {
            bucket: "b".into(),
            key: "k".into(),
            message: "NoSuchKey".into(),
        };
        assert_eq!(download.category(), ErrorCategory::Transport);
        assert_eq!(
            Error::rejected("Template format error").category(),
            ErrorCategory::Data
        );
        assert_eq!(
            Error::validation_transport("dispatch failure").category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::ArtifactCount { count: 0 }.category(),
            ErrorCategory::Data
        );
        assert_eq!(
            Error::Report {
                job_id: "j".into(),
                message: "throttled".into()
            }
            .category(),
            ErrorCategory::Reporting
        );
        assert_eq!(Error::fault("boom").category(), ErrorCategory::Internal);
        assert_eq!(
            Error::invalid_event("missing field `objectKey`").category(),
            ErrorCategory::Data
        );
    }

    #[test]
    fn test_local_io_is_not_transport() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::StorageFull,
            "no space left on device",
        ));
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_display_includes_location() {
        let err = Error::Download {
            bucket: "artifacts".into(),
            key: "pipeline/merged.zip".into(),
            message: "NoSuchKey".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to download s3://artifacts/pipeline/merged.zip: NoSuchKey"
        );

        let err = Error::TemplateMissing {
            path: PathBuf::from("/tmp/x/merged.yml"),
        };
        assert_eq!(err.to_string(), "Template not found at /tmp/x/merged.yml");
    }
}
