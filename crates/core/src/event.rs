//! CodePipeline job invocation event.
//!
//! Only the job id is required when deserializing; absent fields default.
//! Fields that are present with the wrong type still fail the parse, which
//! is why the handler resolves the job id from the raw payload first.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level invocation event delivered by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineEvent {
    /// The job this invocation is responsible for
    #[serde(rename = "CodePipeline.job")]
    pub job: PipelineJob,
}

impl PipelineEvent {
    /// Identifier used for the terminal signal.
    #[must_use]
    pub fn job_id(&self) -> &str {
        &self.job.id
    }
}

/// A single pipeline job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    /// Job identifier
    pub id: String,

    /// AWS account owning the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Job payload
    #[serde(default)]
    pub data: JobData,
}

/// Payload of a pipeline job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    /// User parameters configured on the action
    #[serde(default)]
    pub action_configuration: ActionConfiguration,

    /// Artifacts produced by earlier stages
    #[serde(default)]
    pub input_artifacts: Vec<Artifact>,

    /// Artifacts this action is expected to produce
    #[serde(default)]
    pub output_artifacts: Vec<Artifact>,

    /// Temporary credentials scoped to the artifact bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_credentials: Option<ArtifactCredentials>,

    /// Set when the job is a continuation of an earlier invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Action configuration block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfiguration {
    /// Free-form configuration values
    #[serde(default)]
    pub configuration: HashMap<String, String>,
}

/// A pipeline artifact descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Artifact name
    #[serde(default)]
    pub name: String,

    /// Source revision, when the producing stage records one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    /// Storage location
    #[serde(default)]
    pub location: ArtifactLocation,
}

/// Where an artifact is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    /// Location type, `S3` for every artifact this handler can read
    #[serde(rename = "type", default)]
    pub location_type: String,

    /// S3 coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_location: Option<S3Location>,
}

/// Bucket and key of an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct S3Location {
    /// Bucket name
    #[serde(default)]
    pub bucket_name: String,
    /// Object key
    #[serde(default)]
    pub object_key: String,
}

impl fmt::Display for S3Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket_name, self.object_key)
    }
}

/// Temporary credentials the pipeline hands out for artifact access.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCredentials {
    /// Access key id
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key
    #[serde(default)]
    pub secret_access_key: String,
    /// Session token
    #[serde(default)]
    pub session_token: String,
}

impl fmt::Debug for ArtifactCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[redacted]")
            .field("session_token", &"[redacted]")
            .finish()
    }
}

impl ArtifactCredentials {
    /// Check that every credential field is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] naming the empty fields.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("accessKeyId", &self.access_key_id),
            ("secretAccessKey", &self.secret_access_key),
            ("sessionToken", &self.session_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidCredentials {
                missing: missing.join(", "),
            })
        }
    }
}

/// Everything the download step needs, resolved from the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    /// Artifact name
    pub name: String,
    /// Object coordinates
    pub location: S3Location,
    /// Credentials for the artifact bucket
    pub credentials: ArtifactCredentials,
}

impl PipelineJob {
    /// Resolve the single input artifact and its credentials.
    ///
    /// # Errors
    ///
    /// Fails if the job does not carry exactly one input artifact, if that
    /// artifact has no S3 location, or if the credentials are incomplete.
    pub fn artifact_request(&self) -> Result<ArtifactRequest> {
        let artifact = match self.data.input_artifacts.as_slice() {
            [artifact] => artifact,
            other => return Err(Error::ArtifactCount { count: other.len() }),
        };

        let location = artifact
            .location
            .s3_location
            .as_ref()
            .filter(|s3| !s3.bucket_name.is_empty() && !s3.object_key.is_empty())
            .ok_or_else(|| Error::ArtifactLocation {
                artifact: artifact.name.clone(),
            })?;

        let credentials = self
            .data
            .artifact_credentials
            .clone()
            .ok_or_else(|| Error::InvalidCredentials {
                missing: "artifactCredentials".to_string(),
            })?;
        credentials.validate()?;

        Ok(ArtifactRequest {
            name: artifact.name.clone(),
            location: location.clone(),
            credentials,
        })
    }
}
