//! Artifact download from S3 using the job's temporary credentials.

use std::path::Path;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use stagecheck_core::{ArtifactCredentials, ArtifactRequest, ArtifactStore, Error, Result};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Provider name attached to the per-job credentials.
const CREDENTIALS_PROVIDER: &str = "codepipeline-artifact";

/// Reads pipeline artifacts from S3.
///
/// The pipeline hands out credentials per job, so a client is built for each
/// download on top of the shared region and HTTP settings.
#[derive(Debug, Clone)]
pub struct S3ArtifactStore {
    base: SdkConfig,
}

impl S3ArtifactStore {
    /// Create a store sharing region and HTTP settings with `base`.
    #[must_use]
    pub fn new(base: &SdkConfig) -> Self {
        Self { base: base.clone() }
    }

    fn client_for(&self, credentials: &ArtifactCredentials) -> Client {
        let credentials = Credentials::new(
            &credentials.access_key_id,
            &credentials.secret_access_key,
            Some(credentials.session_token.clone()),
            None,
            CREDENTIALS_PROVIDER,
        );
        let config = aws_sdk_s3::config::Builder::from(&self.base)
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .build();
        Client::from_conf(config)
    }
}

fn download_error(request: &ArtifactRequest, message: impl Into<String>) -> Error {
    Error::Download {
        bucket: request.location.bucket_name.clone(),
        key: request.location.object_key.clone(),
        message: message.into(),
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn download(&self, request: &ArtifactRequest, dest: &Path) -> Result<u64> {
        let client = self.client_for(&request.credentials);

        let response = client
            .get_object()
            .bucket(&request.location.bucket_name)
            .key(&request.location.object_key)
            .send()
            .await
            .map_err(|e| download_error(request, DisplayErrorContext(&e).to_string()))?;

        debug!(
            content_length = ?response.content_length(),
            dest = %dest.display(),
            "Streaming artifact to scratch storage"
        );

        let mut body = response.body;
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0_u64;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| download_error(request, format!("stream interrupted: {e}")))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}
