//! External services the workflow talks to.
//!
//! The handler only sees these traits; the AWS-backed implementations live
//! in `stagecheck-aws`.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::event::ArtifactRequest;
use crate::template::TemplateSummary;

/// Longest failure message the orchestrator accepts.
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 5000;

/// Longest execution summary the orchestrator accepts.
pub const MAX_SUCCESS_SUMMARY_CHARS: usize = 2048;

/// Object storage holding pipeline artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stream the artifact to `dest`, returning the number of bytes written.
    async fn download(&self, request: &ArtifactRequest, dest: &Path) -> Result<u64>;
}

/// Provider-side template validation.
#[async_trait]
pub trait TemplateValidator: Send + Sync {
    /// Submit `template_body` and return its structural summary.
    async fn validate(&self, template_body: &str) -> Result<TemplateSummary>;
}

/// Pipeline orchestrator receiving the terminal job signal.
#[async_trait]
pub trait JobReporter: Send + Sync {
    /// Mark the job as succeeded.
    async fn report_success(&self, job_id: &str, details: &SuccessDetails) -> Result<()>;

    /// Mark the job as failed.
    async fn report_failure(&self, job_id: &str, details: &FailureDetails) -> Result<()>;
}

/// Payload of a success signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessDetails {
    /// Short human-readable summary shown in the pipeline console
    pub summary: String,
    /// Identifier of this execution, such as the invocation request id
    pub external_execution_id: Option<String>,
}

impl SuccessDetails {
    /// Build success details for a validated template.
    #[must_use]
    pub fn for_summary(summary: &TemplateSummary, external_execution_id: Option<&str>) -> Self {
        Self {
            summary: truncate_chars(
                &format!("Template validated: {summary}"),
                MAX_SUCCESS_SUMMARY_CHARS,
            ),
            external_execution_id: external_execution_id.map(str::to_string),
        }
    }
}

/// Payload of a failure signal.
///
/// Every failure is reported as a plain job failure; the message only
/// carries the error text for the pipeline console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDetails {
    /// Error text
    pub message: String,
    /// Identifier of this execution, such as the invocation request id
    pub external_execution_id: Option<String>,
}

impl FailureDetails {
    /// Build failure details from the error that ended the workflow.
    #[must_use]
    pub fn from_error(error: &Error, external_execution_id: Option<&str>) -> Self {
        Self {
            message: truncate_chars(&error.to_string(), MAX_FAILURE_MESSAGE_CHARS),
            external_execution_id: external_execution_id.map(str::to_string),
        }
    }
}

/// Cut `text` to at most `max` characters on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exactly", 7), "exactly");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        // multi-byte characters are never split
        assert_eq!(truncate_chars("ééé", 2), "éé");
    }

    #[test]
    fn test_failure_details_are_bounded() {
        let error = Error::rejected("x".repeat(MAX_FAILURE_MESSAGE_CHARS * 2));
        let details = FailureDetails::from_error(&error, Some("req-1"));
        assert_eq!(details.message.chars().count(), MAX_FAILURE_MESSAGE_CHARS);
        assert!(details.message.starts_with("Template validation failed: "));
        assert_eq!(details.external_execution_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_success_details() {
        let summary = TemplateSummary {
            description: Some("Backend".into()),
            ..TemplateSummary::default()
        };
        let details = SuccessDetails::for_summary(&summary, None);
        assert_eq!(details.summary, "Template validated: 0 parameter(s): Backend");
        assert!(details.external_execution_id.is_none());
    }
}
