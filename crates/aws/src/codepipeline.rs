//! Job result signalling through the CodePipeline job API.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_codepipeline::Client;
use aws_sdk_codepipeline::config::retry::RetryConfig;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types::{self, ExecutionDetails, FailureType};
use stagecheck_core::{Error, FailureDetails, JobReporter, Result, SuccessDetails};
use tracing::debug;

/// Reports job results to CodePipeline.
#[derive(Debug, Clone)]
pub struct CodePipelineReporter {
    client: Client,
}

impl CodePipelineReporter {
    /// Create a reporter from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        let config = aws_sdk_codepipeline::config::Builder::from(config)
            .retry_config(RetryConfig::disabled())
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }
}

fn report_error(job_id: &str, message: impl Into<String>) -> Error {
    Error::Report {
        job_id: job_id.to_string(),
        message: message.into(),
    }
}

fn execution_details(details: &SuccessDetails) -> ExecutionDetails {
    ExecutionDetails::builder()
        .summary(&details.summary)
        .set_external_execution_id(details.external_execution_id.clone())
        .build()
}

fn failure_details(job_id: &str, details: &FailureDetails) -> Result<types::FailureDetails> {
    types::FailureDetails::builder()
        .r#type(FailureType::JobFailed)
        .message(&details.message)
        .set_external_execution_id(details.external_execution_id.clone())
        .build()
        .map_err(|e| report_error(job_id, format!("invalid failure details: {e}")))
}

#[async_trait]
impl JobReporter for CodePipelineReporter {
    async fn report_success(&self, job_id: &str, details: &SuccessDetails) -> Result<()> {
        let output = self
            .client
            .put_job_success_result()
            .job_id(job_id)
            .execution_details(execution_details(details))
            .send()
            .await
            .map_err(|e| report_error(job_id, DisplayErrorContext(&e).to_string()))?;
        debug!(?output, "PutJobSuccessResult acknowledged");
        Ok(())
    }

    async fn report_failure(&self, job_id: &str, details: &FailureDetails) -> Result<()> {
        let output = self
            .client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(failure_details(job_id, details)?)
            .send()
            .await
            .map_err(|e| report_error(job_id, DisplayErrorContext(&e).to_string()))?;
        debug!(?output, "PutJobFailureResult acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{request_body, response, sdk_config};
    use aws_smithy_http_client::test_util::StaticReplayClient;

    const JSON: &str = "application/x-amz-json-1.1";

    fn reporter(replay: &StaticReplayClient) -> CodePipelineReporter {
        CodePipelineReporter::new(&sdk_config(replay))
    }

    #[test]
    fn test_failure_details_are_job_failed() {
        let details = FailureDetails {
            message: "Template validation failed: ValidationError".to_string(),
            external_execution_id: Some("req-1".to_string()),
        };

        let built = failure_details("job-1", &details).unwrap();
        assert_eq!(built.r#type(), &FailureType::JobFailed);
        assert_eq!(built.message(), "Template validation failed: ValidationError");
        assert_eq!(built.external_execution_id(), Some("req-1"));
    }

    #[test]
    fn test_execution_details() {
        let details = SuccessDetails {
            summary: "Template validated: 0 parameter(s)".to_string(),
            external_execution_id: None,
        };

        let built = execution_details(&details);
        assert_eq!(built.summary(), Some("Template validated: 0 parameter(s)"));
        assert!(built.external_execution_id().is_none());
    }

    #[test]
    fn test_report_error() {
        let err = report_error("job-1", "AccessDenied");
        assert_eq!(err.to_string(), "Failed to report job job-1 result: AccessDenied");
    }

    #[tokio::test]
    async fn test_report_success_sends_job_and_summary() {
        let replay = StaticReplayClient::new(vec![response(200, JSON, "{}")]);
        let details = SuccessDetails {
            summary: "Template validated: 1 parameter(s)".to_string(),
            external_execution_id: Some("req-9".to_string()),
        };

        reporter(&replay)
            .report_success("job-1", &details)
            .await
            .unwrap();

        assert_eq!(replay.actual_requests().count(), 1);
        let body = request_body(&replay, 0);
        assert!(body.contains(r#""jobId":"job-1""#), "{body}");
        assert!(body.contains("Template validated: 1 parameter(s)"), "{body}");
        assert!(body.contains("req-9"), "{body}");
    }

    #[tokio::test]
    async fn test_report_failure_sends_job_failed() {
        let replay = StaticReplayClient::new(vec![response(200, JSON, "{}")]);
        let details = FailureDetails {
            message: "Template not found at merged.yml".to_string(),
            external_execution_id: None,
        };

        reporter(&replay)
            .report_failure("job-1", &details)
            .await
            .unwrap();

        let body = request_body(&replay, 0);
        assert!(body.contains(r#""type":"JobFailed""#), "{body}");
        assert!(body.contains("Template not found at merged.yml"), "{body}");
    }

    #[tokio::test]
    async fn test_rejected_signal_is_report_error() {
        let replay = StaticReplayClient::new(vec![response(
            400,
            JSON,
            r#"{"__type":"JobNotFoundException","message":"The job was specified in an invalid format or cannot be found."}"#,
        )]);
        let details = FailureDetails {
            message: "boom".to_string(),
            external_execution_id: None,
        };

        let err = reporter(&replay)
            .report_failure("job-1", &details)
            .await
            .unwrap_err();

        match err {
            Error::Report { job_id, message } => {
                assert_eq!(job_id, "job-1");
                assert!(message.contains("JobNotFoundException"), "{message}");
            }
            other => panic!("expected report error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_throttled_signal_is_not_retried() {
        let throttled = r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#;
        let replay = StaticReplayClient::new(vec![
            response(400, JSON, throttled),
            response(200, JSON, "{}"),
        ]);
        let details = SuccessDetails {
            summary: "Template validated".to_string(),
            external_execution_id: None,
        };

        let err = reporter(&replay)
            .report_success("job-1", &details)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Report { .. }));
        assert_eq!(replay.actual_requests().count(), 1);
    }
}
