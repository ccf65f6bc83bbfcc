//! Normalizes heterogeneous AWS log envelopes into canonical log records
//! attributed to the resource that produced them, and delivers batches to
//! the LogicMonitor log-ingest API with LMv1 request signing.
//!
//! The pipeline for one invocation is: classify the trigger payload,
//! decode/decompress its content, derive the resource identity, build the
//! record batch, scrub it, and ship it. See [`pipeline::Forwarder`].

pub mod attribution;
pub mod cloudtrail;
pub mod config;
pub mod error;
pub mod event;
pub mod ingest;
pub mod pipeline;
pub mod record;
pub mod s3_logs;
pub mod scrub;

#[cfg(test)]
mod test_util;

pub use config::Config;
pub use error::ForwarderError;
pub use ingest::{Credentials, IngestClient};
pub use pipeline::{Forwarder, ObjectFetcher};
pub use record::{LogRecord, ResourceId};
