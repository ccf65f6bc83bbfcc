//! AWS Lambda entry point for the LogicMonitor log forwarder.
//!
//! Wires the external collaborators (S3 object fetch, Secrets Manager
//! credentials, the Lambda runtime loop) around the core pipeline. Errors
//! propagate to the runtime so its redelivery policy applies to the whole
//! invocation.

mod aws;

use aws::{get_secret_value, S3ObjectFetcher};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use lm_logs_forwarder::{Config, Credentials, Forwarder, IngestClient};
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;

    let log_level = if config.debug { "debug" } else { "info" };
    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter)?)
        .with_target(false)
        // CloudWatch adds the ingestion time
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let secrets = aws_sdk_secretsmanager::Client::new(&sdk_config);
    let access_id = get_secret_value(&secrets, &config.access_id_arn).await?;
    let access_key = get_secret_value(&secrets, &config.access_key_arn).await?;

    let client = IngestClient::new(
        config.host.clone(),
        Credentials {
            access_id,
            access_key,
        },
        config.debug,
    )?;
    let fetcher = S3ObjectFetcher::new(aws_sdk_s3::Client::new(&sdk_config));
    let forwarder = Arc::new(Forwarder::new(Arc::new(config), fetcher, client));

    info!(
        function = %env::var("AWS_LAMBDA_FUNCTION_NAME").unwrap_or_default(),
        "Forwarder started"
    );

    run(service_fn(move |event: LambdaEvent<Value>| {
        let forwarder = Arc::clone(&forwarder);
        async move { handle(&forwarder, event).await }
    }))
    .await
}

async fn handle(
    forwarder: &Forwarder<S3ObjectFetcher>,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    match forwarder.handle(&event.payload).await {
        Ok(sent) => {
            info!(records = sent, "Batch delivered");
            Ok(json!({
                "ok": true,
                "message": format!("{sent} events sent"),
            }))
        }
        Err(e) => {
            error!(request_id = %event.context.request_id, "Invocation failed: {e}");
            Err(e.into())
        }
    }
}
