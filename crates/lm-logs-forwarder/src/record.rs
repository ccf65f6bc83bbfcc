//! Canonical log records and the resource identities attached to them.
//!
//! Every log line that leaves the forwarder is a [`LogRecord`]: the raw
//! message, a millisecond-precision timestamp, and the identity of the AWS
//! resource that produced it. Identities are a small key/value attribute set
//! under `_lm.resourceId`; most resources are identified by a single
//! `system.aws.arn` attribute, with account-level and network-interface
//! identities as the exceptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute key holding a full ARN.
pub const ARN_KEY: &str = "system.aws.arn";
/// Attribute key for account-level attribution.
pub const ACCOUNT_ID_KEY: &str = "system.aws.accountid";
/// Attribute key for ENI-level attribution (NAT gateway flow logs).
pub const NETWORK_INTERFACE_ID_KEY: &str = "system.aws.networkInterfaceId";
/// Attribute key marking the resource category.
pub const CLOUD_CATEGORY_KEY: &str = "system.cloud.category";
/// Category value used for account-level CloudTrail attribution.
pub const ACCOUNT_CATEGORY: &str = "AWS/LMAccount";

/// Resource identity attached to a log record.
///
/// A non-empty attribute map; exactly one identity scheme applies per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(BTreeMap<String, String>);

impl ResourceId {
    /// Identity from a single ARN.
    pub fn from_arn(arn: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(ARN_KEY.to_string(), arn.into());
        ResourceId(attributes)
    }

    /// Identity from an elastic network interface id.
    pub fn from_network_interface(eni_id: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(NETWORK_INTERFACE_ID_KEY.to_string(), eni_id.into());
        ResourceId(attributes)
    }

    /// Account-level identity, used when no specific resource can be derived.
    pub fn from_account(account_id: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(ACCOUNT_ID_KEY.to_string(), account_id.into());
        attributes.insert(CLOUD_CATEGORY_KEY.to_string(), ACCOUNT_CATEGORY.to_string());
        ResourceId(attributes)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One normalized, delivery-ready log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "msg")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "_lm.resourceId")]
    pub resource_id: ResourceId,
}

impl LogRecord {
    pub fn new(message: impl Into<String>, timestamp: DateTime<Utc>, resource_id: ResourceId) -> Self {
        LogRecord {
            message: message.into(),
            timestamp,
            resource_id,
        }
    }
}

/// Converts a CloudWatch epoch-milliseconds timestamp to a time value.
///
/// Out-of-range values map to the epoch rather than failing the batch.
pub fn timestamp_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
