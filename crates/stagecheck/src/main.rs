//! stagecheck Lambda entry point
//!
//! Receives CodePipeline job events, validates the CloudFormation template in
//! the job's input artifact, and reports the result back to the pipeline.

mod logging;

use std::sync::Arc;

use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value;
use stagecheck_aws::AwsValidationHandler;
use stagecheck_core::HandlerConfig;

use crate::logging::{LogFormat, init_tracing};

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing(LogFormat::from_env()?)?;

    let config = HandlerConfig::default();
    config.validate()?;
    tracing::info!(
        scratch_root = %config.scratch_root.display(),
        archive = %config.archive_name,
        template = %config.template_path.display(),
        "Starting stagecheck"
    );

    let sdk_config = stagecheck_aws::load_sdk_config().await;
    let handler = Arc::new(stagecheck_aws::build_handler(config, &sdk_config));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = Arc::clone(&handler);
        async move { handle_event(&handler, event).await }
    }))
    .await
    .map_err(|e| miette::miette!("Lambda runtime failed: {e}"))
}

/// Run one job. Only an undeliverable signal or an event without a job id
/// fails the invocation; the handler logs every job outcome.
async fn handle_event(
    handler: &AwsValidationHandler,
    event: LambdaEvent<Value>,
) -> Result<(), lambda_runtime::Error> {
    let (payload, context) = event.into_parts();
    handler
        .handle_json(payload, Some(context.request_id.as_str()))
        .await?;
    Ok(())
}
