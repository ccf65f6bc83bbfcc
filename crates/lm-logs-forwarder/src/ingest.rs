//! LMv1 request signing and delivery to the log-ingest endpoint.
//!
//! LMv1 authenticates each request with an HMAC-SHA256 over the method,
//! the signing epoch (milliseconds), the body bytes and the resource path:
//!
//! ```text
//! signature = base64( hex( hmac_sha256(access_key, METHOD || epoch || body || path) ) )
//! Authorization: LMv1 <access_id>:<signature>:<epoch>
//! ```
//!
//! The signature is recomputed with a fresh epoch for every request and
//! never persisted. Delivery is atomic: the batch is accepted as a whole
//! (HTTP 202) or the invocation fails and the runtime redelivers it.

use crate::error::ForwarderError;
use crate::record::LogRecord;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use sha2::Sha256;
use std::fmt;
use tracing::{debug, error};

type HmacSha256 = Hmac<Sha256>;

/// URL path the batch is POSTed to.
const INGEST_PATH: &str = "/rest/log/ingest";
/// Resource path covered by the signature (the API strips the `/rest` prefix).
const SIGNED_PATH: &str = "/log/ingest";

const USER_AGENT: &str = concat!("lm-logs-aws/", env!("CARGO_PKG_VERSION"));

/// LMv1 API credentials, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_id: String,
    pub access_key: String,
}

/// A computed LMv1 authorization token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lmv1Token {
    pub access_id: String,
    pub signature: String,
    pub epoch_millis: i64,
}

impl fmt::Display for Lmv1Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LMv1 {}:{}:{}",
            self.access_id, self.signature, self.epoch_millis
        )
    }
}

/// Signs one request deterministically from the credentials, method,
/// resource path, body and signing epoch.
pub fn generate_token(
    credentials: &Credentials,
    method: &str,
    resource_path: &str,
    body: &[u8],
    epoch_millis: i64,
) -> Lmv1Token {
    let method = method.to_uppercase();

    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(credentials.access_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(method.as_bytes());
    mac.update(epoch_millis.to_string().as_bytes());
    mac.update(body);
    mac.update(resource_path.as_bytes());

    let hex_digest = hex::encode(mac.finalize().into_bytes());
    let signature = BASE64.encode(hex_digest.as_bytes());

    Lmv1Token {
        access_id: credentials.access_id.clone(),
        signature,
        epoch_millis,
    }
}

/// HTTP client for the log-ingest endpoint.
#[derive(Debug, Clone)]
pub struct IngestClient {
    client: reqwest::Client,
    host: String,
    credentials: Credentials,
    debug: bool,
}

impl IngestClient {
    pub fn new(
        host: impl Into<String>,
        credentials: Credentials,
        debug: bool,
    ) -> Result<Self, ForwarderError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(IngestClient {
            client,
            host: host.into(),
            credentials,
            debug,
        })
    }

    /// Delivers one batch. Empty batches are skipped without a request;
    /// anything but HTTP 202 is a fatal delivery failure.
    pub async fn send_logs(&self, batch: &[LogRecord]) -> Result<(), ForwarderError> {
        if batch.is_empty() {
            debug!("Empty batch, nothing to send");
            return Ok(());
        }

        let body = serde_json::to_vec(batch)?;
        let epoch_millis = Utc::now().timestamp_millis();
        let token = generate_token(&self.credentials, "POST", SIGNED_PATH, &body, epoch_millis);

        let url = format!("{}{}", self.host, INGEST_PATH);
        if self.debug {
            debug!(%url, payload = %String::from_utf8_lossy(&body), "Sending ingest request");
        }

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, token.to_string())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Ingest service did not accept the batch");
            return Err(ForwarderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(records = batch.len(), "Batch accepted");
        Ok(())
    }
}
