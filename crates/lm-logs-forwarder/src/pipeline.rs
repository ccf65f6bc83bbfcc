//! The invocation pipeline: classify, decode, attribute, build, scrub,
//! deliver.
//!
//! One trigger payload is processed to completion with no fan-out and no
//! local retries; the invoking runtime's redelivery policy is the only
//! resilience layer. Object content and the final POST are the only
//! blocking I/O.

use crate::attribution;
use crate::config::Config;
use crate::error::ForwarderError;
use crate::event::{S3EventRecord, S3LogKind, TriggerSource};
use crate::ingest::IngestClient;
use crate::record::LogRecord;
use crate::s3_logs;
use crate::scrub::scrub;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Fetches raw object bytes for a bucket/key pair.
///
/// Implemented by the Lambda harness with the S3 SDK; tests supply stubs.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ForwarderError>;
}

/// Drives one invocation end to end.
pub struct Forwarder<F> {
    config: Arc<Config>,
    fetcher: F,
    client: IngestClient,
}

impl<F: ObjectFetcher> Forwarder<F> {
    pub fn new(config: Arc<Config>, fetcher: F, client: IngestClient) -> Self {
        Forwarder {
            config,
            fetcher,
            client,
        }
    }

    /// Processes one trigger payload and returns how many records were sent.
    pub async fn handle(&self, payload: &serde_json::Value) -> Result<usize, ForwarderError> {
        let source = TriggerSource::classify(payload)?;
        let mut records = self.extract(source).await?;
        scrub(&mut records, self.config.scrub_regex.as_ref());
        self.client.send_logs(&records).await?;
        Ok(records.len())
    }

    async fn extract(&self, source: TriggerSource) -> Result<Vec<LogRecord>, ForwarderError> {
        match source {
            TriggerSource::CloudWatch(envelope) => {
                let data = envelope.decode()?;
                debug!(
                    log_group = %data.log_group,
                    events = data.log_events.len(),
                    "Decoded CloudWatch batch"
                );
                attribution::build_records(&data, &self.config.region)
            }
            TriggerSource::S3 { kind, event } => {
                let record = event.records.first().ok_or_else(|| {
                    ForwarderError::UnrecognizedPayload("S3 notification with no records".to_string())
                })?;
                let content = self.fetch_object(record).await?;
                match kind {
                    S3LogKind::Elb => s3_logs::parse_elb_records(
                        &record.s3.object.key,
                        &content,
                        record.event_time,
                    ),
                    S3LogKind::AccessLog => {
                        s3_logs::parse_s3_access_records(&content, record.event_time)
                    }
                }
            }
        }
    }

    async fn fetch_object(&self, record: &S3EventRecord) -> Result<Vec<u8>, ForwarderError> {
        let bucket = &record.s3.bucket.name;
        let key = &record.s3.object.key;
        debug!(%bucket, %key, "Fetching object content");
        self.fetcher.fetch(bucket, key).await
    }
}
