use crate::utils::error::{Result, SyncError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Optional file configuration for the blacklist job. Every field can be overridden
/// from the command line or environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub slack: SlackSection,
    #[serde(default)]
    pub genesys: GenesysSection,
    #[serde(default)]
    pub watermark: WatermarkSection,
    #[serde(default)]
    pub retry: RetrySection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackSection {
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    pub api_url: Option<String>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesysSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub region: Option<String>,
    pub api_base: Option<String>,
    pub login_base: Option<String>,
    pub data_table_id: Option<String>,
    pub email_column: Option<String>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatermarkSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub fallback_delay_seconds: Option<u64>,
    pub max_delay_seconds: Option<u64>,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left verbatim
    /// and later treated as absent by `resolved`.
    fn substitute_env_vars(content: &str) -> String {
        placeholder_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }
}

/// `None` for missing values and for placeholders whose variable was not set.
pub fn resolved(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| !placeholder_pattern().is_match(v))
        .filter(|v| !v.trim().is_empty())
        .cloned()
}

pub fn require(field: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| SyncError::MissingConfigError {
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
[slack]
channel_id = "C0123456789"
page_size = 200

[genesys]
region = "eu_central_1"
data_table_id = "dt-1"
email_column = "Email"

[watermark]
path = "state/last_run_timestamp.txt"
"#,
        )
        .unwrap();

        assert_eq!(config.slack.channel_id.as_deref(), Some("C0123456789"));
        assert_eq!(config.slack.page_size, Some(200));
        assert_eq!(config.genesys.email_column.as_deref(), Some("Email"));
        assert_eq!(
            config.watermark.path.as_deref(),
            Some("state/last_run_timestamp.txt")
        );
        assert!(config.retry.max_attempts.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GENESYS_OPS_TEST_TOKEN", "xoxb-from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[slack]
bot_token = "${GENESYS_OPS_TEST_TOKEN}"

[genesys]
client_secret = "${GENESYS_OPS_TEST_UNSET_SECRET}"
"#,
        )
        .unwrap();

        assert_eq!(resolved(&config.slack.bot_token).as_deref(), Some("xoxb-from-env"));
        assert_eq!(resolved(&config.genesys.client_secret), None);

        std::env::remove_var("GENESYS_OPS_TEST_TOKEN");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[slack\nchannel_id = 1").unwrap_err();
        assert!(matches!(err, SyncError::TomlError(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[genesys]\ndata_table_id = \"dt-from-file\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.genesys.data_table_id.as_deref(), Some("dt-from-file"));
    }
}
