#[cfg(feature = "cli")]
pub mod args;
pub mod cli;
pub mod lambda;
pub mod toml_config;

use crate::adapters::genesys::datatable::DEFAULT_EMAIL_COLUMN;
use crate::adapters::genesys::{GenesysRegion, GenesysSettings};
use crate::adapters::http::RetryPolicy;
use crate::adapters::slack::{DEFAULT_SLACK_API_URL, MAX_HISTORY_PAGE_SIZE};
use crate::core::watermark::DEFAULT_WATERMARK_FILE;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{
    validate_channel_id, validate_non_empty_string, validate_path, validate_range, validate_secret,
    validate_url, Validate,
};
use std::time::Duration;
use toml_config::{require, resolved, RetrySection};

pub const DEFAULT_REGION: &str = "us_east_1";
pub const DEFAULT_SLACK_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TABLE_PAGE_SIZE: u32 = 500;
const MAX_TABLE_PAGE_SIZE: u32 = 500;

/// Fully resolved settings for one blacklist run.
#[derive(Debug, Clone)]
pub struct BlacklistSettings {
    pub slack_token: String,
    pub channel_id: String,
    pub slack_api_url: String,
    pub slack_page_size: u32,
    pub genesys: GenesysSettings,
    pub data_table_id: String,
    pub email_column: String,
    pub table_page_size: u32,
    pub watermark_path: String,
    pub dry_run: bool,
}

pub fn retry_policy(section: &RetrySection, max_attempts: Option<u32>) -> RetryPolicy {
    let defaults = RetryPolicy::default();
    RetryPolicy {
        max_attempts: max_attempts
            .or(section.max_attempts)
            .unwrap_or(defaults.max_attempts),
        fallback_delay: section
            .fallback_delay_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.fallback_delay),
        max_delay: section
            .max_delay_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_delay),
    }
}

/// Parses an optional numeric setting; a present but malformed value is an error.
pub fn parse_number(field: &str, value: Option<String>) -> Result<Option<u32>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| SyncError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: raw.clone(),
                    reason: "Expected a non-negative integer".to_string(),
                })
        })
        .transpose()
}

impl BlacklistSettings {
    /// Settings from environment variables only, for hosts without a command line.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| resolved(&std::env::var(name).ok());
        let number = |name: &str| parse_number(name, var(name));
        let retry = retry_policy(&RetrySection::default(), number("MAX_RETRIES")?);

        let region = var("GENESYS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        Ok(Self {
            slack_token: require("SLACK_BOT_TOKEN", var("SLACK_BOT_TOKEN"))?,
            channel_id: require("SLACK_CHANNEL_ID", var("SLACK_CHANNEL_ID"))?,
            slack_api_url: var("SLACK_API_URL").unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string()),
            slack_page_size: number("SLACK_PAGE_SIZE")?.unwrap_or(DEFAULT_SLACK_PAGE_SIZE),
            genesys: GenesysSettings {
                client_id: require("GENESYS_CLIENT_ID", var("GENESYS_CLIENT_ID"))?,
                client_secret: require("GENESYS_CLIENT_SECRET", var("GENESYS_CLIENT_SECRET"))?,
                region: GenesysRegion::parse(&region)?,
                api_base: var("GENESYS_API_BASE"),
                login_base: var("GENESYS_LOGIN_BASE"),
                retry,
            },
            data_table_id: require("GENESYS_DATA_TABLE_ID", var("GENESYS_DATA_TABLE_ID"))?,
            email_column: var("GENESYS_EMAIL_COLUMN")
                .unwrap_or_else(|| DEFAULT_EMAIL_COLUMN.to_string()),
            table_page_size: number("GENESYS_TABLE_PAGE_SIZE")?
                .unwrap_or(DEFAULT_TABLE_PAGE_SIZE),
            watermark_path: var("WATERMARK_FILE")
                .unwrap_or_else(|| DEFAULT_WATERMARK_FILE.to_string()),
            dry_run: var("DRY_RUN").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        })
    }
}

pub fn validate_genesys(settings: &GenesysSettings) -> Result<()> {
    validate_secret("GENESYS_CLIENT_ID", &settings.client_id)?;
    validate_secret("GENESYS_CLIENT_SECRET", &settings.client_secret)?;
    if let Some(api_base) = &settings.api_base {
        validate_url("GENESYS_API_BASE", api_base)?;
    }
    if let Some(login_base) = &settings.login_base {
        validate_url("GENESYS_LOGIN_BASE", login_base)?;
    }
    validate_range("max_retries", settings.retry.max_attempts, 1, 10)?;
    Ok(())
}

impl Validate for BlacklistSettings {
    fn validate(&self) -> Result<()> {
        validate_secret("SLACK_BOT_TOKEN", &self.slack_token)?;
        validate_channel_id("SLACK_CHANNEL_ID", &self.channel_id)?;
        validate_url("SLACK_API_URL", &self.slack_api_url)?;
        validate_range("slack_page_size", self.slack_page_size, 1, MAX_HISTORY_PAGE_SIZE)?;
        validate_genesys(&self.genesys)?;
        validate_non_empty_string("GENESYS_DATA_TABLE_ID", &self.data_table_id)?;
        validate_non_empty_string("GENESYS_EMAIL_COLUMN", &self.email_column)?;
        validate_range("table_page_size", self.table_page_size, 1, MAX_TABLE_PAGE_SIZE)?;
        validate_path("WATERMARK_FILE", &self.watermark_path)?;

        tracing::debug!("✅ Blacklist configuration validation passed");
        Ok(())
    }
}
