//! Shared helpers for unit tests.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Encodes a CloudWatch subscription payload the way the service does:
/// JSON, gzipped, base64.
pub fn encode_cloudwatch(data: &serde_json::Value) -> String {
    BASE64.encode(gzip(data.to_string().as_bytes()))
}
