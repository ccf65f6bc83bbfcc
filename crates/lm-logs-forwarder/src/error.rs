/// Errors raised while normalizing and delivering log batches.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unrecognized trigger payload: {0}")]
    UnrecognizedPayload(String),

    #[error("Failed to decode CloudWatch Logs payload: {0}")]
    Decode(String),

    #[error("Failed to attribute log group '{log_group}': {reason}")]
    Attribution { log_group: String, reason: String },

    #[error("Failed to parse object key '{key}': {reason}")]
    ObjectKey { key: String, reason: String },

    #[error("Failed to fetch object '{bucket}/{key}': {reason}")]
    Fetch {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Failed to serialize batch: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Ingest request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Ingest service rejected the batch: status {status}, body: {body}")]
    Rejected { status: u16, body: String },
}
