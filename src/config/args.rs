use super::toml_config::{require, resolved, GenesysSection, TomlConfig};
use super::{
    retry_policy, BlacklistSettings, DEFAULT_REGION, DEFAULT_SLACK_PAGE_SIZE,
    DEFAULT_TABLE_PAGE_SIZE,
};
use crate::adapters::genesys::datatable::DEFAULT_EMAIL_COLUMN;
use crate::adapters::genesys::{GenesysRegion, GenesysSettings};
use crate::adapters::http::RetryPolicy;
use crate::adapters::slack::DEFAULT_SLACK_API_URL;
use crate::core::report::ReportFormat;
use crate::core::watermark::DEFAULT_WATERMARK_FILE;
use crate::utils::error::Result;
use clap::{Args, Parser};
use std::path::PathBuf;

/// Genesys Cloud credentials and environment, shared by every job.
#[derive(Debug, Clone, Default, Args)]
pub struct GenesysArgs {
    /// OAuth client id (falls back to CLIENT_ID)
    #[arg(long, env = "GENESYS_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth client secret (falls back to CLIENT_SECRET)
    #[arg(long, env = "GENESYS_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Region name (eu_central_1) or environment domain (mypurecloud.de)
    #[arg(long, env = "GENESYS_REGION")]
    pub region: Option<String>,

    /// Override the API base URL derived from the region
    #[arg(long, env = "GENESYS_API_BASE")]
    pub api_base: Option<String>,

    /// Override the login base URL derived from the region
    #[arg(long, env = "GENESYS_LOGIN_BASE")]
    pub login_base: Option<String>,
}

impl GenesysArgs {
    pub fn resolve(
        &self,
        file: &GenesysSection,
        default_region: Option<&str>,
        retry: RetryPolicy,
    ) -> Result<GenesysSettings> {
        let legacy = |name: &str| resolved(&std::env::var(name).ok());

        let client_id = resolved(&self.client_id)
            .or_else(|| resolved(&file.client_id))
            .or_else(|| legacy("CLIENT_ID"));
        let client_secret = resolved(&self.client_secret)
            .or_else(|| resolved(&file.client_secret))
            .or_else(|| legacy("CLIENT_SECRET"));
        let region = resolved(&self.region)
            .or_else(|| resolved(&file.region))
            .or_else(|| default_region.map(str::to_string));

        Ok(GenesysSettings {
            client_id: require("GENESYS_CLIENT_ID", client_id)?,
            client_secret: require("GENESYS_CLIENT_SECRET", client_secret)?,
            region: GenesysRegion::parse(&require("GENESYS_REGION", region)?)?,
            api_base: resolved(&self.api_base).or_else(|| resolved(&file.api_base)),
            login_base: resolved(&self.login_base).or_else(|| resolved(&file.login_base)),
            retry,
        })
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "update-blacklist")]
#[command(about = "Append email addresses posted in a Slack channel to a Genesys Cloud blacklist data table")]
pub struct BlacklistArgs {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_token: Option<String>,

    /// Channel to scan, e.g. C0123456789
    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub channel: Option<String>,

    #[arg(long, env = "SLACK_API_URL")]
    pub slack_api_url: Option<String>,

    /// Messages per conversations.history page
    #[arg(long, env = "SLACK_PAGE_SIZE")]
    pub slack_page_size: Option<u32>,

    #[command(flatten)]
    pub genesys: GenesysArgs,

    #[arg(long, env = "GENESYS_DATA_TABLE_ID")]
    pub data_table_id: Option<String>,

    /// Data table column holding the email address
    #[arg(long, env = "GENESYS_EMAIL_COLUMN")]
    pub email_column: Option<String>,

    /// Rows per data table page
    #[arg(long, env = "GENESYS_TABLE_PAGE_SIZE")]
    pub table_page_size: Option<u32>,

    /// Where the last processed message timestamp is kept
    #[arg(long, env = "WATERMARK_FILE")]
    pub watermark_file: Option<String>,

    /// Attempts per request while rate limited
    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Plan inserts without writing rows or the watermark
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl BlacklistArgs {
    /// Command line and environment win over the config file.
    pub fn resolve(&self) -> Result<BlacklistSettings> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        let retry = retry_policy(&file.retry, self.max_retries);
        let genesys = self
            .genesys
            .resolve(&file.genesys, Some(DEFAULT_REGION), retry)?;

        Ok(BlacklistSettings {
            slack_token: require(
                "SLACK_BOT_TOKEN",
                resolved(&self.slack_token).or_else(|| resolved(&file.slack.bot_token)),
            )?,
            channel_id: require(
                "SLACK_CHANNEL_ID",
                resolved(&self.channel).or_else(|| resolved(&file.slack.channel_id)),
            )?,
            slack_api_url: resolved(&self.slack_api_url)
                .or_else(|| resolved(&file.slack.api_url))
                .unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string()),
            slack_page_size: self
                .slack_page_size
                .or(file.slack.page_size)
                .unwrap_or(DEFAULT_SLACK_PAGE_SIZE),
            genesys,
            data_table_id: require(
                "GENESYS_DATA_TABLE_ID",
                resolved(&self.data_table_id).or_else(|| resolved(&file.genesys.data_table_id)),
            )?,
            email_column: resolved(&self.email_column)
                .or_else(|| resolved(&file.genesys.email_column))
                .unwrap_or_else(|| DEFAULT_EMAIL_COLUMN.to_string()),
            table_page_size: self
                .table_page_size
                .or(file.genesys.page_size)
                .unwrap_or(DEFAULT_TABLE_PAGE_SIZE),
            watermark_path: resolved(&self.watermark_file)
                .or_else(|| resolved(&file.watermark.path))
                .unwrap_or_else(|| DEFAULT_WATERMARK_FILE.to_string()),
            dry_run: self.dry_run,
        })
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "useralias")]
#[command(about = "Update Genesys Cloud agent profile names to first name only")]
pub struct AliasArgs {
    /// Division whose users are updated
    #[arg(long, env = "GENESYS_DIVISION_ID")]
    pub division_id: Option<String>,

    #[command(flatten)]
    pub genesys: GenesysArgs,

    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Log the changes without patching users
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "check-preferred-names")]
#[command(about = "List Genesys Cloud users with empty or mismatched preferred names")]
pub struct CheckArgs {
    /// Process only this division id
    #[arg(long)]
    pub specific_division: Option<String>,

    /// Write the results to this file instead of the log
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[command(flatten)]
    pub genesys: GenesysArgs,

    #[arg(long, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
