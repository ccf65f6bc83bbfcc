//! Parsing of S3-notification-triggered logs (ELB access logs and generic
//! S3 / CloudFront access logs).
//!
//! ELB encodes account, region and load-balancer name in the object key;
//! generic access logs name their origin bucket in the first line of the
//! content. Either way the object may arrive gzip-compressed, so content
//! goes through the decompression check before any string extraction.

use crate::error::ForwarderError;
use crate::event::maybe_decompress;
use crate::record::{LogRecord, ResourceId};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

// Both tolerate an arbitrary key prefix before `AWSLogs/`.
static ELB_ACCOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"AWSLogs/(.*)/elasticloadbalancing").expect("valid regex"));

static ELB_REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/elasticloadbalancing/(.*?)/").expect("valid regex"));

fn key_error(key: &str, reason: impl Into<String>) -> ForwarderError {
    ForwarderError::ObjectKey {
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parses one ELB access-log object into records.
///
/// The object key follows
/// `[prefix/]AWSLogs/<account>/elasticloadbalancing/<region>/.../<account>_elasticloadbalancing_<region>_<name>_<ts>_<ip>_<id>.<ext>`;
/// the load-balancer name is the 4th `_` token with dots restored to
/// slashes (classic ELB names embed a path). Every line shares the derived
/// ARN and the notification's event time.
///
/// Tokenization splits the whole key on `_`, so an optional prefix before
/// `AWSLogs/` is tolerated only when it contains no underscore; one would
/// shift every token.
pub fn parse_elb_records(
    key: &str,
    content: &[u8],
    event_time: DateTime<Utc>,
) -> Result<Vec<LogRecord>, ForwarderError> {
    let content = maybe_decompress(content)?;
    let text = String::from_utf8_lossy(&content);

    let tokens: Vec<&str> = key.split('_').collect();
    let path = tokens[0];

    let account_id = ELB_ACCOUNT
        .captures(path)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| key_error(key, "no account id"))?
        .as_str();

    let region = ELB_REGION
        .captures(path)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| key_error(key, "no region"))?
        .as_str();

    let name = tokens
        .get(3)
        .ok_or_else(|| key_error(key, "no load balancer name"))?
        .replace('.', "/");

    let arn = format!("arn:aws:elasticloadbalancing:{region}:{account_id}:loadbalancer/{name}");
    let resource_id = ResourceId::from_arn(arn);

    Ok(text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| LogRecord::new(line, event_time, resource_id.clone()))
        .collect())
}

/// Parses one generic S3 / CloudFront access-log object.
///
/// The origin bucket is the second space-delimited token of the first line;
/// the whole object becomes a single record.
pub fn parse_s3_access_records(
    content: &[u8],
    event_time: DateTime<Utc>,
) -> Result<Vec<LogRecord>, ForwarderError> {
    let content = maybe_decompress(content)?;
    let text = String::from_utf8_lossy(&content).into_owned();

    let origin_bucket = text
        .lines()
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ForwarderError::Decode("access log content has no origin bucket token".to_string())
        })?;

    let resource_id = ResourceId::from_arn(format!("arn:aws:s3:::{origin_bucket}"));
    Ok(vec![LogRecord::new(text.clone(), event_time, resource_id)])
}
