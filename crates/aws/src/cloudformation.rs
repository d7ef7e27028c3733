//! Template validation through CloudFormation `ValidateTemplate`.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::config::retry::RetryConfig;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::operation::validate_template::ValidateTemplateOutput;
use stagecheck_core::{Error, Result, TemplateParameter, TemplateSummary, TemplateValidator};
use tracing::debug;

/// Validates templates with the function's own credentials.
#[derive(Debug, Clone)]
pub struct CloudFormationValidator {
    client: Client,
}

impl CloudFormationValidator {
    /// Create a validator from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        let config = aws_sdk_cloudformation::config::Builder::from(config)
            .retry_config(RetryConfig::disabled())
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }
}

#[async_trait]
impl TemplateValidator for CloudFormationValidator {
    async fn validate(&self, template_body: &str) -> Result<TemplateSummary> {
        debug!(bytes = template_body.len(), "Calling ValidateTemplate");

        let output = self
            .client
            .validate_template()
            .template_body(template_body)
            .send()
            .await
            .map_err(|e| {
                let server_fault = e
                    .raw_response()
                    .is_some_and(|response| response.status().is_server_error());
                match e.as_service_error() {
                    Some(service) if !server_fault => {
                        Error::rejected(rejection_message(service.code(), service.message()))
                    }
                    _ => Error::validation_transport(DisplayErrorContext(&e).to_string()),
                }
            })?;

        Ok(summary_from_output(&output))
    }
}

/// Render a service-side rejection such as `ValidationError: Template format error`.
fn rejection_message(code: Option<&str>, message: Option<&str>) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message.to_string(),
        (Some(code), None) => code.to_string(),
        (None, None) => "template rejected without a message".to_string(),
    }
}

fn summary_from_output(output: &ValidateTemplateOutput) -> TemplateSummary {
    TemplateSummary {
        description: output.description().map(str::to_string),
        parameters: output
            .parameters()
            .iter()
            .map(|p| TemplateParameter {
                key: p.parameter_key().unwrap_or_default().to_string(),
                default_value: p.default_value().map(str::to_string),
                no_echo: p.no_echo().unwrap_or(false),
                description: p.description().map(str::to_string),
            })
            .collect(),
        capabilities: output
            .capabilities()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
        capabilities_reason: output.capabilities_reason().map(str::to_string),
        declared_transforms: output.declared_transforms().to_vec(),
    }
}
