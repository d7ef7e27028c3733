//! AWS integration for stagecheck
//!
//! Implements the workflow's service traits on top of the AWS SDK:
//! - [`S3ArtifactStore`]: artifact download with per-job credentials
//! - [`CloudFormationValidator`]: `ValidateTemplate`
//! - [`CodePipelineReporter`]: `PutJobSuccessResult` / `PutJobFailureResult`
//!
//! Every client is built with SDK retries disabled; each call is made once.

pub mod cloudformation;
pub mod codepipeline;
pub mod s3;

#[cfg(test)]
mod test_support;

pub use cloudformation::CloudFormationValidator;
pub use codepipeline::CodePipelineReporter;
pub use s3::S3ArtifactStore;

use aws_config::SdkConfig;
use stagecheck_core::{HandlerConfig, ValidationHandler};

/// Handler wired to the AWS services.
pub type AwsValidationHandler =
    ValidationHandler<S3ArtifactStore, CloudFormationValidator, CodePipelineReporter>;

/// Load shared SDK configuration from the default provider chain.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await
}

/// Build a handler whose clients share `sdk_config`.
#[must_use]
pub fn build_handler(config: HandlerConfig, sdk_config: &SdkConfig) -> AwsValidationHandler {
    ValidationHandler::new(
        config,
        S3ArtifactStore::new(sdk_config),
        CloudFormationValidator::new(sdk_config),
        CodePipelineReporter::new(sdk_config),
    )
}
