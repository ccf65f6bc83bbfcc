//! CloudTrail sub-resolver.
//!
//! Each CloudTrail event message is itself a JSON document. The resource
//! identity is extracted with regexes over the raw text rather than a full
//! JSON parse, so partial or odd-shaped payloads degrade to account-level
//! attribution for that one event instead of failing the batch.

use crate::record::ResourceId;
use once_cell::sync::Lazy;
use regex::Regex;

static EVENT_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""eventSource":\s*"([^",]*)"#).expect("valid regex"));

// Resource names appear either as a JSON field (with or without a space
// after the colon) or inside an ARN path segment.
static FIREHOSE_STREAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("deliveryStreamName":"|"deliveryStreamName": "|:deliverystream/)([^/][^,][^"]*)"#)
        .expect("valid regex")
});

static KINESIS_STREAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("streamName":"|"streamName": "|:stream/)([^/][^,][^"]*)"#).expect("valid regex")
});

static ECS_CLUSTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"("cluster":"|"cluster": "|:cluster/)([^/][^,][^"]*)"#).expect("valid regex")
});

fn extract_name(pattern: &Regex, message: &str) -> Option<String> {
    pattern
        .captures(message)
        .and_then(|captures| captures.get(2))
        .map(|name| name.as_str().to_string())
}

/// Resolves the identity for one CloudTrail event message.
///
/// Unknown event sources and extraction failures fall back to account-level
/// attribution; this function never fails.
pub fn resolve_event(message: &str, owner: &str, region: &str) -> ResourceId {
    let source = EVENT_SOURCE
        .captures(message)
        .and_then(|captures| captures.get(1))
        .map(|source| source.as_str().to_string());

    let arn = match source.as_deref() {
        Some("firehose.amazonaws.com") => extract_name(&FIREHOSE_STREAM, message)
            .map(|name| format!("arn:aws:firehose:{region}:{owner}:deliverystream/{name}")),
        Some("kinesis.amazonaws.com") => extract_name(&KINESIS_STREAM, message)
            .map(|name| format!("arn:aws:kinesis:{region}:{owner}:stream/{name}")),
        Some("ecs.amazonaws.com") => extract_name(&ECS_CLUSTER, message)
            .map(|name| format!("arn:aws:ecs:{region}:{owner}:cluster/{name}")),
        _ => None,
    };

    match arn {
        Some(arn) => ResourceId::from_arn(arn),
        None => ResourceId::from_account(owner),
    }
}
