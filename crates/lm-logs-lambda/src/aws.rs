//! AWS SDK collaborators: object content fetch and secret retrieval.

use async_trait::async_trait;
use lm_logs_forwarder::{ForwarderError, ObjectFetcher};

/// [`ObjectFetcher`] backed by the S3 SDK.
#[derive(Debug, Clone)]
pub struct S3ObjectFetcher {
    client: aws_sdk_s3::Client,
}

impl S3ObjectFetcher {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        S3ObjectFetcher { client }
    }
}

#[async_trait]
impl ObjectFetcher for S3ObjectFetcher {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ForwarderError> {
        let fetch_error = |reason: String| ForwarderError::Fetch {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason,
        };

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| fetch_error(e.to_string()))?
            .into_bytes();

        Ok(bytes.to_vec())
    }
}

/// Reads one secret string; an error or empty value is fatal at startup.
pub async fn get_secret_value(
    client: &aws_sdk_secretsmanager::Client,
    secret_arn: &str,
) -> Result<String, ForwarderError> {
    let output = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| {
            ForwarderError::InvalidConfig(format!("could not read secret '{secret_arn}': {e}"))
        })?;

    let value = output.secret_string().unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(ForwarderError::InvalidConfig(format!(
            "secret '{secret_arn}' is empty"
        )));
    }
    Ok(value)
}
