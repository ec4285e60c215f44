use crate::utils::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A Slack message timestamp (`<seconds>.<micros>`), also used as the run watermark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlackTs {
    secs: u64,
    micros: u32,
}

impl SlackTs {
    pub const ZERO: SlackTs = SlackTs { secs: 0, micros: 0 };

    pub fn new(secs: u64, micros: u32) -> Self {
        debug_assert!(micros < 1_000_000);
        Self { secs, micros }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.secs).ok()?, self.micros * 1_000)
    }
}

impl fmt::Display for SlackTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

impl FromStr for SlackTs {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| SyncError::InvalidWatermark {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let (secs_part, frac_part) = match trimmed.split_once('.') {
            Some((_, "")) => return Err(invalid("fraction is empty after the dot")),
            Some((secs, frac)) => (secs, frac),
            None => (trimmed, ""),
        };

        if secs_part.is_empty() || !secs_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("seconds must be a non-negative integer"));
        }
        if frac_part.len() > 6 || !frac_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("fraction must have at most six digits"));
        }

        let secs = secs_part
            .parse::<u64>()
            .map_err(|_| invalid("seconds out of range"))?;
        let micros = if frac_part.is_empty() {
            0
        } else {
            // "5" means half a second, not five microseconds
            format!("{:0<6}", frac_part)
                .parse::<u32>()
                .map_err(|_| invalid("fraction out of range"))?
        };

        Ok(Self { secs, micros })
    }
}

impl Serialize for SlackTs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlackTs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackMessage {
    pub ts: SlackTs,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// A validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Callers must validate first; see `core::extract`.
    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The table already holds the key (HTTP 409).
    AlreadyExists,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DivisionRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: String,
    pub name: String,
}

impl Division {
    /// Placeholder for a division selected by id only.
    pub fn from_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Division {}", id),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenesysUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferred_name: Option<String>,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub division: Option<DivisionRef>,
}

impl GenesysUser {
    /// First whitespace-separated word of the full name.
    pub fn first_name(&self) -> Option<&str> {
        self.name.as_deref()?.split_whitespace().next()
    }

    pub fn in_division(&self, division_id: &str) -> bool {
        self.division
            .as_ref()
            .is_some_and(|division| division.id == division_id)
    }

    /// True when the trimmed preferred name already equals `first_name`.
    pub fn preferred_name_matches(&self, first_name: &str) -> bool {
        self.preferred_name
            .as_deref()
            .is_some_and(|preferred| preferred.trim() == first_name)
    }
}

/// A user whose preferred name is empty or differs from their first name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NameMismatch {
    #[serde(rename = "User ID")]
    pub id: String,
    #[serde(rename = "Full Name")]
    pub full_name: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Preferred Name")]
    pub preferred_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Division")]
    pub division: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub messages_scanned: usize,
    pub candidates: usize,
    pub rejected: usize,
    pub existing_rows: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub failed: usize,
    pub watermark_before: SlackTs,
    pub watermark_after: SlackTs,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AliasReport {
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_ts_parsing() {
        assert_eq!("0".parse::<SlackTs>().unwrap(), SlackTs::ZERO);
        assert_eq!(
            "1712345678.123456".parse::<SlackTs>().unwrap(),
            SlackTs::new(1712345678, 123456)
        );
        assert_eq!(
            "1712345678.5".parse::<SlackTs>().unwrap(),
            SlackTs::new(1712345678, 500000)
        );
        assert_eq!(
            " 1712345678.000100\n".parse::<SlackTs>().unwrap(),
            SlackTs::new(1712345678, 100)
        );
    }

    #[test]
    fn test_slack_ts_rejects_garbage() {
        assert!("".parse::<SlackTs>().is_err());
        assert!("-1".parse::<SlackTs>().is_err());
        assert!("1.2345678".parse::<SlackTs>().is_err());
        assert!("1e9".parse::<SlackTs>().is_err());
        assert!("abc.123".parse::<SlackTs>().is_err());
        assert!("1712345678.".parse::<SlackTs>().is_err());
        assert!(".5".parse::<SlackTs>().is_err());
    }

    #[test]
    fn test_slack_ts_ordering_and_display() {
        let a: SlackTs = "1712345678.000009".parse().unwrap();
        let b: SlackTs = "1712345678.000010".parse().unwrap();
        assert!(a < b);
        assert_eq!(a.to_string(), "1712345678.000009");
        assert_eq!(SlackTs::ZERO.to_string(), "0.000000");
    }

    #[test]
    fn test_slack_message_deserializes_ts_string() {
        let message: SlackMessage = serde_json::from_value(serde_json::json!({
            "type": "message",
            "ts": "1712345678.123456",
            "text": "hello"
        }))
        .unwrap();
        assert_eq!(message.ts, SlackTs::new(1712345678, 123456));
        assert_eq!(message.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_user_first_name() {
        let user = GenesysUser {
            id: "u1".to_string(),
            name: Some("  Ada   Lovelace ".to_string()),
            email: None,
            preferred_name: Some(" Ada ".to_string()),
            version: Some(3),
            division: Some(DivisionRef {
                id: "d1".to_string(),
                name: None,
            }),
        };
        assert_eq!(user.first_name(), Some("Ada"));
        assert!(user.preferred_name_matches("Ada"));
        assert!(user.in_division("d1"));
        assert!(!user.in_division("d2"));
    }
}
