//! Resource attribution for CloudWatch Logs batches.
//!
//! The log group name is the primary signal for which AWS resource produced
//! a batch. Resolution is two-phase: the rule table below first decides
//! whether identity is derived from the log group (one identity for the
//! whole batch) or from each event's content (EC2 flow logs and CloudTrail),
//! and record building then applies the outcome per event with a pure
//! function.
//!
//! Rules are checked in order against the log group; first match wins:
//!
//! 1. `RDSOSMetrics` — RDS enhanced monitoring, instance id inside the
//!    first event's JSON body
//! 2. `/aws/rds` — instance or cluster name from the log group path
//! 3. `/aws/lambda` — function name from the log group path (the
//!    forwarder's own `/aws/lambda/lm` group is excluded)
//! 4. `/aws/ec2/networkInterface` — per-event, instance id is the first
//!    token of each message
//! 5. `/aws/natGateway/networkInterface` — ENI id from the log stream name
//! 6. `/aws/kinesisfirehose` — delivery stream name from the log group path
//! 7. `/aws/cloudtrail` — per-event, dispatched on the event source inside
//!    each CloudTrail document
//! 8. anything else — the log stream name is treated as an EC2 instance id

use crate::cloudtrail;
use crate::error::ForwarderError;
use crate::event::CloudWatchLogsData;
use crate::record::{timestamp_from_millis, LogRecord, ResourceId};
use once_cell::sync::Lazy;
use regex::Regex;

static RDS_LOG_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/aws/rds/(instance|cluster)/([^/]*)").expect("valid regex")
});

static LAMBDA_LOG_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"aws/lambda/(.*)").expect("valid regex"));

/// Outcome of the first resolution phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// One identity shared by every record in the batch.
    Static(ResourceId),
    /// Identity is derived from each event's message.
    PerEvent(PerEventRule),
}

/// Per-event attribution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerEventRule {
    /// EC2 flow logs: the first token of the message is the instance id.
    Ec2NetworkInterface,
    /// CloudTrail: each message is a JSON document naming its event source.
    CloudTrail,
}

impl PerEventRule {
    /// Computes the identity for a single event message.
    pub fn resource_for(&self, message: &str, owner: &str, region: &str) -> ResourceId {
        match self {
            PerEventRule::Ec2NetworkInterface => {
                let instance_id = message.split_whitespace().next().unwrap_or_default();
                ResourceId::from_arn(format!(
                    "arn:aws:ec2:{region}:{owner}:instance/{instance_id}"
                ))
            }
            PerEventRule::CloudTrail => cloudtrail::resolve_event(message, owner, region),
        }
    }
}

fn attribution_error(data: &CloudWatchLogsData, reason: impl Into<String>) -> ForwarderError {
    ForwarderError::Attribution {
        log_group: data.log_group.clone(),
        reason: reason.into(),
    }
}

/// Resolves the identity scheme for a decoded CloudWatch batch.
pub fn resolve(data: &CloudWatchLogsData, region: &str) -> Result<Attribution, ForwarderError> {
    let log_group = data.log_group.as_str();
    let owner = data.owner.as_str();

    if log_group == "RDSOSMetrics" {
        let first = data
            .log_events
            .first()
            .ok_or_else(|| attribution_error(data, "empty RDSOSMetrics batch"))?;
        let body: serde_json::Value = serde_json::from_str(&first.message)
            .map_err(|e| attribution_error(data, format!("bad RDSOSMetrics event: {e}")))?;
        let instance_id = body
            .get("instanceID")
            .and_then(|v| v.as_str())
            .ok_or_else(|| attribution_error(data, "RDSOSMetrics event without instanceID"))?;
        return Ok(Attribution::Static(ResourceId::from_arn(format!(
            "arn:aws:rds:{region}:{owner}:db:{instance_id}"
        ))));
    }

    if log_group.contains("/aws/rds") {
        let captures = RDS_LOG_GROUP
            .captures(log_group)
            .ok_or_else(|| attribution_error(data, "no instance or cluster name"))?;
        let name = &captures[2];
        return Ok(Attribution::Static(ResourceId::from_arn(format!(
            "arn:aws:rds:{region}:{owner}:db:{name}"
        ))));
    }

    // The forwarder's own log group would make it ingest itself.
    if log_group != "/aws/lambda/lm" && log_group.contains("/aws/lambda") {
        let captures = LAMBDA_LOG_GROUP
            .captures(log_group)
            .ok_or_else(|| attribution_error(data, "no function name"))?;
        let name = &captures[1];
        return Ok(Attribution::Static(ResourceId::from_arn(format!(
            "arn:aws:lambda:{region}:{owner}:function:{name}"
        ))));
    }

    if log_group.contains("/aws/ec2/networkInterface") {
        return Ok(Attribution::PerEvent(PerEventRule::Ec2NetworkInterface));
    }

    if log_group.contains("/aws/natGateway/networkInterface") {
        let mut tokens = data.log_stream.split('-');
        match (tokens.next(), tokens.next()) {
            (Some(prefix), Some(suffix)) if !suffix.is_empty() => {
                return Ok(Attribution::Static(ResourceId::from_network_interface(
                    format!("{prefix}-{suffix}"),
                )));
            }
            _ => return Err(attribution_error(data, "log stream is not an ENI id")),
        }
    }

    if log_group.contains("/aws/kinesisfirehose") {
        let name = log_group
            .split('/')
            .nth(3)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| attribution_error(data, "no delivery stream name"))?;
        return Ok(Attribution::Static(ResourceId::from_arn(format!(
            "arn:aws:firehose:{region}:{owner}:deliverystream/{name}"
        ))));
    }

    if log_group.contains("/aws/cloudtrail") {
        return Ok(Attribution::PerEvent(PerEventRule::CloudTrail));
    }

    Ok(Attribution::Static(ResourceId::from_arn(format!(
        "arn:aws:ec2:{region}:{owner}:instance/{}",
        data.log_stream
    ))))
}

/// Builds the record batch for a decoded CloudWatch envelope.
///
/// Empty and whitespace-only messages are dropped, never emitted.
pub fn build_records(
    data: &CloudWatchLogsData,
    region: &str,
) -> Result<Vec<LogRecord>, ForwarderError> {
    let attribution = resolve(data, region)?;

    let records = data
        .log_events
        .iter()
        .filter(|event| !event.message.trim().is_empty())
        .map(|event| {
            let resource_id = match &attribution {
                Attribution::Static(resource_id) => resource_id.clone(),
                Attribution::PerEvent(rule) => {
                    rule.resource_for(&event.message, &data.owner, region)
                }
            };
            LogRecord::new(
                event.message.clone(),
                timestamp_from_millis(event.timestamp),
                resource_id,
            )
        })
        .collect();

    Ok(records)
}
