//! The pipeline job handler.
//!
//! One invocation runs download, extraction and validation in order, then
//! sends exactly one terminal signal. Any error or panic before the signal
//! turns into a failure signal; an error from the signal call itself is
//! returned to the caller.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures::FutureExt;
use serde_json::Value;
use tracing::{Instrument, error, info, info_span, instrument, warn};

use crate::archive::{ExtractionSummary, extract_zip};
use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::event::{PipelineEvent, PipelineJob};
use crate::scratch::ScratchSpace;
use crate::services::{
    ArtifactStore, FailureDetails, JobReporter, SuccessDetails, TemplateValidator,
};
use crate::template::{TemplateSummary, read_template};

/// Terminal result of one handled job.
#[derive(Debug)]
pub enum JobOutcome {
    /// Template validated and the success signal was delivered.
    Succeeded {
        /// Structural summary from the validation service
        summary: TemplateSummary,
    },
    /// The workflow failed and the failure signal was delivered.
    Failed {
        /// Error that ended the workflow
        error: Error,
    },
}

impl JobOutcome {
    /// Whether the job was reported as succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Validates the template carried by a pipeline job and reports the result.
pub struct ValidationHandler<S, V, R> {
    config: HandlerConfig,
    store: S,
    validator: V,
    reporter: R,
}

impl<S, V, R> std::fmt::Debug for ValidationHandler<S, V, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationHandler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S, V, R> ValidationHandler<S, V, R>
where
    S: ArtifactStore,
    V: TemplateValidator,
    R: JobReporter,
{
    /// Create a handler from its configuration and service clients.
    pub fn new(config: HandlerConfig, store: S, validator: V, reporter: R) -> Self {
        Self {
            config,
            store,
            validator,
            reporter,
        }
    }

    /// Handler configuration.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Handle a raw invocation payload.
    ///
    /// The job id is resolved before the rest of the event is parsed, so an
    /// event that is malformed anywhere else is still failed against its job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEvent`] without sending a signal when the
    /// payload has no job id, and otherwise behaves like [`Self::handle`].
    pub async fn handle_json(
        &self,
        payload: Value,
        execution_id: Option<&str>,
    ) -> Result<JobOutcome> {
        let Some(job_id) = job_id_of(&payload).map(str::to_string) else {
            error!("Event carries no CodePipeline job id, no signal can be sent");
            return Err(Error::invalid_event("missing CodePipeline.job.id"));
        };

        match serde_json::from_value::<PipelineEvent>(payload) {
            Ok(event) => self.handle(&event, execution_id).await,
            Err(e) => {
                self.finish(&job_id, Err(Error::invalid_event(e.to_string())), execution_id)
                    .instrument(info_span!("handle_job", job_id = %job_id))
                    .await
            }
        }
    }

    /// Handle one pipeline event.
    ///
    /// `execution_id` is forwarded to the orchestrator as the external
    /// execution id when present.
    ///
    /// # Errors
    ///
    /// Only fails when the terminal signal cannot be delivered. Every other
    /// failure is reported to the orchestrator and returned as
    /// [`JobOutcome::Failed`].
    #[instrument(name = "handle_job", skip_all, fields(job_id = %event.job_id()))]
    pub async fn handle(
        &self,
        event: &PipelineEvent,
        execution_id: Option<&str>,
    ) -> Result<JobOutcome> {
        let result = AssertUnwindSafe(self.run(&event.job))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::fault(panic_message(panic.as_ref()))));

        self.finish(event.job_id(), result, execution_id).await
    }

    /// Send the single terminal signal for `result`.
    async fn finish(
        &self,
        job_id: &str,
        result: Result<TemplateSummary>,
        execution_id: Option<&str>,
    ) -> Result<JobOutcome> {
        match result {
            Ok(summary) => {
                info!("Sending success signal to pipeline");
                let details = SuccessDetails::for_summary(&summary, execution_id);
                self.reporter.report_success(job_id, &details).await?;
                info!("Pipeline success signal sent");
                Ok(JobOutcome::Succeeded { summary })
            }
            Err(error) => {
                warn!(error = %error, category = ?error.category(), "Job failed");
                info!("Sending failure signal to pipeline");
                let details = FailureDetails::from_error(&error, execution_id);
                if let Err(report_error) = self.reporter.report_failure(job_id, &details).await {
                    error!(error = %report_error, "Failed to deliver failure signal");
                    return Err(report_error);
                }
                info!("Pipeline failure signal sent");
                Ok(JobOutcome::Failed { error })
            }
        }
    }

    /// Download, extract and validate. Never sends a signal.
    async fn run(&self, job: &PipelineJob) -> Result<TemplateSummary> {
        let request = job.artifact_request()?;
        let scratch = ScratchSpace::create(&self.config)?;

        info!(
            bucket = %request.location.bucket_name,
            key = %request.location.object_key,
            "Downloading pipeline artifact"
        );
        let bytes = self
            .store
            .download(&request, scratch.archive_path())
            .await?;
        info!(bytes, "Artifact downloaded");

        let extracted = extract_blocking(
            scratch.archive_path().to_path_buf(),
            scratch.extract_dir().to_path_buf(),
        )
        .await?;
        info!(
            files = extracted.files,
            directories = extracted.directories,
            "Artifact extracted"
        );

        let body = read_template(scratch.template_path()).await?;

        info!(
            template = %self.config.template_path.display(),
            "Validating template"
        );
        let summary = self.validator.validate(&body).await?;
        info!(
            %summary,
            parameters = ?summary.parameters,
            capabilities = ?summary.capabilities,
            "Template validated"
        );

        Ok(summary)
    }
}

async fn extract_blocking(archive: PathBuf, target: PathBuf) -> Result<ExtractionSummary> {
    tokio::task::spawn_blocking(move || extract_zip(&archive, &target))
        .await
        .map_err(|e| {
            if e.is_panic() {
                Error::fault(panic_message(e.into_panic().as_ref()))
            } else {
                Error::fault(format!("extraction task did not complete: {e}"))
            }
        })?
}

/// Non-empty `CodePipeline.job.id` of a raw event.
fn job_id_of(payload: &Value) -> Option<&str> {
    payload
        .get("CodePipeline.job")?
        .get("id")?
        .as_str()
        .filter(|id| !id.is_empty())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_id_of() {
        let payload = json!({"CodePipeline.job": {"id": "job-1", "data": null}});
        assert_eq!(job_id_of(&payload), Some("job-1"));

        assert_eq!(job_id_of(&json!({"CodePipeline.job": {"id": ""}})), None);
        assert_eq!(job_id_of(&json!({"CodePipeline.job": {"id": 7}})), None);
        assert_eq!(job_id_of(&json!({"job": {"id": "job-1"}})), None);
        assert_eq!(job_id_of(&json!("not an object")), None);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "panic with non-string payload");
    }
}
