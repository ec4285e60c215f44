use crate::domain::model::{EmailAddress, SlackMessage};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const MAX_EMAIL_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_LABEL_LEN: usize = 63;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("email pattern is a valid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooLong,
    LocalPart,
    Domain,
    TopLevelDomain,
}

/// Normalizes and validates one candidate token.
pub fn validate_email(candidate: &str) -> Result<EmailAddress, Rejection> {
    let normalized = candidate.trim().to_lowercase();
    if normalized.len() > MAX_EMAIL_LEN {
        return Err(Rejection::TooLong);
    }

    let (local, domain) = normalized.rsplit_once('@').ok_or(Rejection::LocalPart)?;

    if local.is_empty()
        || local.len() > MAX_LOCAL_LEN
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || local.contains('@')
    {
        return Err(Rejection::LocalPart);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(Rejection::Domain);
    }
    for label in &labels {
        if label.is_empty()
            || label.len() > MAX_LABEL_LEN
            || label.starts_with('-')
            || label.ends_with('-')
        {
            return Err(Rejection::Domain);
        }
    }

    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Rejection::TopLevelDomain);
    }

    Ok(EmailAddress::from_normalized(normalized))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub emails: BTreeSet<EmailAddress>,
    pub rejected: usize,
}

impl Extraction {
    pub fn scan_text(&mut self, text: &str) {
        for found in email_pattern().find_iter(text) {
            match validate_email(found.as_str()) {
                Ok(email) => {
                    self.emails.insert(email);
                }
                Err(reason) => {
                    tracing::debug!("🚫 Rejected candidate '{}': {:?}", found.as_str(), reason);
                    self.rejected += 1;
                }
            }
        }
    }
}

/// Emails found across all messages, deduplicated and sorted.
pub fn extract_emails(messages: &[SlackMessage]) -> Extraction {
    let mut extraction = Extraction::default();
    for text in messages.iter().filter_map(|message| message.text.as_deref()) {
        extraction.scan_text(text);
    }
    extraction
}
