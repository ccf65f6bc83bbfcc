//! Forwarder configuration.
//!
//! Built once from the environment at process start and treated as
//! read-only for the lifetime of the process; every component receives it
//! by reference.

use crate::error::ForwarderError;
use regex::Regex;
use std::env;

/// Immutable forwarder configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// AWS region the forwarder runs in; used when building ARNs.
    pub region: String,
    /// Base URL of the LogicMonitor account, e.g. `https://acme.logicmonitor.com`.
    pub host: String,
    /// Secrets Manager ARN holding the LMv1 access id.
    pub access_id_arn: String,
    /// Secrets Manager ARN holding the LMv1 access key.
    pub access_key_arn: String,
    /// Log request and response payloads when set.
    pub debug: bool,
    /// Optional redaction pattern applied to every message before delivery.
    pub scrub_regex: Option<Regex>,
}

impl Config {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, ForwarderError> {
        let region = env::var("AWS_REGION").unwrap_or_default();
        let host = derive_host(
            env::var("LM_HOST").ok().filter(|v| !v.is_empty()),
            env::var("LM_COMPANY_NAME").ok().filter(|v| !v.is_empty()),
        )?;
        let access_id_arn = env::var("LM_ACCESS_ID_ARN").unwrap_or_default();
        let access_key_arn = env::var("LM_ACCESS_KEY_ARN").unwrap_or_default();
        let debug = env::var("DEBUG").map(|v| v.to_lowercase() == "true").unwrap_or(false);

        let scrub_regex = match env::var("LM_SCRUB_REGEX") {
            Ok(pattern) if !pattern.is_empty() => Some(Regex::new(&pattern).map_err(|e| {
                ForwarderError::InvalidConfig(format!("bad LM_SCRUB_REGEX: {e}"))
            })?),
            _ => None,
        };

        let config = Self {
            region,
            host,
            access_id_arn,
            access_key_arn,
            debug,
            scrub_regex,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ForwarderError> {
        if self.host.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "either LM_HOST or LM_COMPANY_NAME must be set".to_string(),
            ));
        }
        if self.access_id_arn.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "LM_ACCESS_ID_ARN must be set".to_string(),
            ));
        }
        if self.access_key_arn.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "LM_ACCESS_KEY_ARN must be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Derives the ingestion host: an explicit host wins, otherwise the
/// company name expands to the standard portal URL.
pub fn derive_host(
    host: Option<String>,
    company: Option<String>,
) -> Result<String, ForwarderError> {
    match (host, company) {
        (Some(host), _) => Ok(host.trim_end_matches('/').to_string()),
        (None, Some(company)) => Ok(format!("https://{company}.logicmonitor.com")),
        (None, None) => Err(ForwarderError::InvalidConfig(
            "either LM_HOST or LM_COMPANY_NAME must be set".to_string(),
        )),
    }
}
