//! Trigger envelopes: classification and payload decoding.
//!
//! A Lambda invocation carries an untyped JSON payload that is either a
//! CloudWatch Logs subscription envelope (`{"awslogs": {"data": ...}}`,
//! where `data` is base64 over gzip over JSON) or an S3 event notification
//! (`{"Records": [...]}`). Classification inspects only the fixed top-level
//! keys and produces a typed sum; any other shape fails the invocation
//! before any I/O happens.

use crate::error::ForwarderError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// CloudWatch Logs subscription envelope as delivered to the trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudWatchEnvelope {
    #[serde(rename = "awslogs")]
    pub aws_logs: AwsLogsPayload,
}

/// The still-encoded subscription payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsLogsPayload {
    pub data: String,
}

/// Decoded CloudWatch Logs batch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudWatchLogsData {
    /// Account id that owns the log group.
    pub owner: String,
    pub log_group: String,
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    #[serde(default)]
    pub message_type: String,
    pub log_events: Vec<CloudWatchLogEvent>,
}

/// One log line inside a CloudWatch batch; `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudWatchLogEvent {
    #[serde(default)]
    pub id: String,
    pub timestamp: i64,
    pub message: String,
}

/// S3 event notification envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventTime")]
    pub event_time: DateTime<Utc>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

/// Which convention the referenced S3 object follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S3LogKind {
    /// ELB access logs; identity comes from the object key.
    Elb,
    /// S3 server-access / CloudFront logs; identity comes from the log body.
    AccessLog,
}

/// Classified trigger payload.
#[derive(Debug, Clone)]
pub enum TriggerSource {
    CloudWatch(CloudWatchEnvelope),
    S3 { kind: S3LogKind, event: S3Event },
}

impl TriggerSource {
    /// Classifies the raw trigger payload by its top-level keys.
    ///
    /// A payload must carry either `awslogs` or `Records`; anything else is
    /// an unrecoverable classification error.
    pub fn classify(payload: &serde_json::Value) -> Result<Self, ForwarderError> {
        let object = payload
            .as_object()
            .ok_or_else(|| ForwarderError::UnrecognizedPayload("payload is not an object".to_string()))?;

        if object.contains_key("awslogs") {
            let envelope: CloudWatchEnvelope = serde_json::from_value(payload.clone())
                .map_err(|e| ForwarderError::UnrecognizedPayload(format!("bad awslogs envelope: {e}")))?;
            return Ok(TriggerSource::CloudWatch(envelope));
        }

        if object.contains_key("Records") {
            let event: S3Event = serde_json::from_value(payload.clone())
                .map_err(|e| ForwarderError::UnrecognizedPayload(format!("bad S3 notification: {e}")))?;
            let first = event.records.first().ok_or_else(|| {
                ForwarderError::UnrecognizedPayload("S3 notification with no records".to_string())
            })?;
            let kind = if first.s3.object.key.contains("elasticloadbalancing") {
                S3LogKind::Elb
            } else {
                S3LogKind::AccessLog
            };
            return Ok(TriggerSource::S3 { kind, event });
        }

        Err(ForwarderError::UnrecognizedPayload(
            "expected 'awslogs' or 'Records' at the top level".to_string(),
        ))
    }
}

impl CloudWatchEnvelope {
    /// Decodes the base64+gzip subscription payload into the typed batch.
    pub fn decode(&self) -> Result<CloudWatchLogsData, ForwarderError> {
        decode_cloudwatch(&self.aws_logs.data)
    }
}

/// base64 -> gzip -> JSON. Every failure is fatal for the invocation.
pub fn decode_cloudwatch(data: &str) -> Result<CloudWatchLogsData, ForwarderError> {
    let compressed = BASE64
        .decode(data)
        .map_err(|e| ForwarderError::Decode(format!("base64: {e}")))?;

    let mut decoder = MultiGzDecoder::new(compressed.as_slice());
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| ForwarderError::Decode(format!("gzip: {e}")))?;

    serde_json::from_slice(&json).map_err(|e| ForwarderError::Decode(format!("json: {e}")))
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decompresses `bytes` when they carry the gzip magic, passes them through
/// otherwise. S3 objects may or may not be compressed depending on the
/// producing service's configuration.
pub fn maybe_decompress(bytes: &[u8]) -> Result<Vec<u8>, ForwarderError> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.to_vec());
    }
    let mut decoder = MultiGzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ForwarderError::Decode(format!("gzip object content: {e}")))?;
    Ok(out)
}
