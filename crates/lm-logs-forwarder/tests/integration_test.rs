use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;
use lm_logs_forwarder::{Config, Credentials, Forwarder, ForwarderError, IngestClient, ObjectFetcher};
use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

struct StubFetcher {
    content: Vec<u8>,
}

#[async_trait]
impl ObjectFetcher for StubFetcher {
    async fn fetch(&self, _bucket: &str, _key: &str) -> Result<Vec<u8>, ForwarderError> {
        Ok(self.content.clone())
    }
}

fn encode_cloudwatch(data: &serde_json::Value) -> String {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data.to_string().as_bytes())
        .expect("gzip write");
    BASE64.encode(encoder.finish().expect("gzip finish"))
}

fn forwarder(host: &str, scrub: Option<&str>, content: Vec<u8>) -> Forwarder<StubFetcher> {
    let config = Arc::new(Config {
        region: "us-west-1".to_string(),
        host: host.to_string(),
        access_id_arn: "arn:aws:secretsmanager:us-west-1:1:secret:id".to_string(),
        access_key_arn: "arn:aws:secretsmanager:us-west-1:1:secret:key".to_string(),
        debug: false,
        scrub_regex: scrub.map(|pattern| regex::Regex::new(pattern).expect("pattern")),
    });
    let client = IngestClient::new(
        host,
        Credentials {
            access_id: "test-id".to_string(),
            access_key: "test-key".to_string(),
        },
        false,
    )
    .expect("client");
    Forwarder::new(config, StubFetcher { content }, client)
}

fn lambda_payload() -> serde_json::Value {
    let data = encode_cloudwatch(&json!({
        "owner": "664833354492",
        "logGroup": "/aws/lambda/billing",
        "logStream": "2020/06/02/[$LATEST]abcdef",
        "logEvents": [
            {"id": "1", "timestamp": 1591092845000i64, "message": "START request"},
            {"id": "2", "timestamp": 1591092845001i64, "message": "END request"}
        ]
    }));
    json!({"awslogs": {"data": data}})
}

#[tokio::test]
async fn cloudwatch_batch_is_signed_and_delivered() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/log/ingest")
        .match_header("Content-Type", "application/json")
        .match_header(
            "Authorization",
            Matcher::Regex(r"^LMv1 test-id:[A-Za-z0-9+/=]+:\d+$".to_string()),
        )
        .match_body(Matcher::PartialJson(json!([
            {
                "msg": "START request",
                "_lm.resourceId": {
                    "system.aws.arn": "arn:aws:lambda:us-west-1:664833354492:function:billing"
                }
            },
            {"msg": "END request"}
        ])))
        .with_status(202)
        .create_async()
        .await;

    let sent = forwarder(&server.url(), None, Vec::new())
        .handle(&lambda_payload())
        .await
        .expect("handle");

    assert_eq!(sent, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_status_fails_the_invocation() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/log/ingest")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let error = forwarder(&server.url(), None, Vec::new())
        .handle(&lambda_payload())
        .await
        .expect_err("must fail");

    match error {
        ForwarderError::Rejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected rejected delivery, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn elb_object_content_is_fetched_and_delivered_per_line() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/log/ingest")
        .match_body(Matcher::PartialJson(json!([
            {
                "msg": "request one",
                "_lm.resourceId": {
                    "system.aws.arn":
                        "arn:aws:elasticloadbalancing:us-west-1:123123123123:loadbalancer/test"
                }
            },
            {"msg": "request two"}
        ])))
        .with_status(202)
        .create_async()
        .await;

    let payload = json!({"Records": [{
        "eventTime": "2020-04-08T15:08:34+02:00",
        "s3": {
            "bucket": {"name": "LogBucket"},
            "object": {"key": "AWSLogs/123123123123/elasticloadbalancing/us-west-1/2020/06/02/123123123123_elasticloadbalancing_us-west-1_test_20200511T0925Z_34.242.46.46_4jtxqo72.txt"}
        }
    }]});

    let sent = forwarder(&server.url(), None, b"request one\nrequest two".to_vec())
        .handle(&payload)
        .await
        .expect("handle");

    assert_eq!(sent, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn s3_access_log_is_delivered_as_one_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/log/ingest")
        .match_body(Matcher::PartialJson(json!([
            {
                "msg": "a OriginBucket c",
                "_lm.resourceId": {"system.aws.arn": "arn:aws:s3:::OriginBucket"}
            }
        ])))
        .with_status(202)
        .create_async()
        .await;

    let payload = json!({"Records": [{
        "eventTime": "2020-04-08T15:08:34+02:00",
        "s3": {
            "bucket": {"name": "LogBucket"},
            "object": {"key": "2020-06-02-access-log"}
        }
    }]});

    let sent = forwarder(&server.url(), None, b"a OriginBucket c".to_vec())
        .handle(&payload)
        .await
        .expect("handle");

    assert_eq!(sent, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn scrub_pattern_redacts_messages_before_delivery() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/log/ingest")
        .match_body(Matcher::PartialJson(json!([
            {"msg": "START request"},
            {"msg": "END request"}
        ])))
        .with_status(202)
        .create_async()
        .await;

    let data = encode_cloudwatch(&json!({
        "owner": "664833354492",
        "logGroup": "/aws/lambda/billing",
        "logStream": "2020/06/02/[$LATEST]abcdef",
        "logEvents": [
            {"id": "1", "timestamp": 1591092845000i64, "message": "START token=abc123 request"},
            {"id": "2", "timestamp": 1591092845001i64, "message": "END token=zzz request"}
        ]
    }));
    let payload = json!({"awslogs": {"data": data}});

    forwarder(&server.url(), Some(r"token=\S+ "), Vec::new())
        .handle(&payload)
        .await
        .expect("handle");

    mock.assert_async().await;
}
