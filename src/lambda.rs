#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use genesys_ops::app::jobs::run_blacklist;
#[cfg(feature = "lambda")]
use genesys_ops::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use genesys_ops::{BlacklistSettings, LambdaConfig, S3Storage};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::{Deserialize, Serialize};

/// Scheduled events carry no required fields; `dry_run` allows a manual test invocation.
#[cfg(feature = "lambda")]
#[derive(Deserialize, Default)]
pub struct Request {
    #[serde(default)]
    pub dry_run: Option<bool>,
}

#[cfg(feature = "lambda")]
#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub messages_scanned: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub failed: usize,
    pub watermark: String,
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    tracing::info!("Starting blacklist Lambda function");

    let mut settings = BlacklistSettings::from_env()?;
    if let Some(dry_run) = event.payload.dry_run {
        settings.dry_run = dry_run;
    }
    settings.validate()?;

    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;
    // The object key replaces the local watermark file name.
    settings.watermark_path = lambda_config.s3_key.clone();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .force_path_style(true)
        .build();
    let storage = S3Storage::new(S3Client::from_conf(config), lambda_config.s3_bucket.clone());

    let report = run_blacklist(&settings, storage).await.map_err(|e| {
        tracing::error!(
            category = ?e.category(),
            severity = ?e.severity(),
            "Blacklist update failed: {}",
            e
        );
        e
    })?;

    let response = Response {
        message: format!("Added {} new emails", report.inserted),
        messages_scanned: report.messages_scanned,
        inserted: report.inserted,
        already_present: report.already_present,
        failed: report.failed,
        watermark: report.watermark_after.to_string(),
    };

    tracing::info!("Blacklist Lambda function completed");
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
