use crate::adapters::http::{ensure_success, send_with_retry, RetryPolicy};
use crate::domain::model::{SlackMessage, SlackTs};
use crate::domain::ports::ChatHistory;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Maximum `limit` accepted by `conversations.history`.
pub const MAX_HISTORY_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Deserialize)]
struct HistoryPage {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<SlackMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

impl HistoryPage {
    fn next_cursor(&self) -> Option<&str> {
        if !self.has_more {
            return None;
        }
        self.response_metadata
            .as_ref()?
            .next_cursor
            .as_deref()
            .filter(|cursor| !cursor.is_empty())
    }
}

pub struct SlackClient {
    client: Client,
    base_url: String,
    token: String,
    page_size: u32,
    retry: RetryPolicy,
}

impl SlackClient {
    pub fn new(base_url: &str, token: &str, page_size: u32, retry: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            page_size: page_size.clamp(1, MAX_HISTORY_PAGE_SIZE),
            retry,
        }
    }

    async fn history_page(
        &self,
        channel: &str,
        oldest: SlackTs,
        cursor: Option<&str>,
    ) -> Result<HistoryPage> {
        let mut query = vec![
            ("channel", channel.to_string()),
            ("oldest", oldest.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let request = self
            .client
            .get(format!("{}/conversations.history", self.base_url))
            .bearer_auth(&self.token)
            .query(&query);

        let response = send_with_retry("slack", request, &self.retry).await?;
        let response = ensure_success("slack", response).await?;
        let page: HistoryPage = response.json().await?;

        if !page.ok {
            return Err(SyncError::SlackError {
                code: page.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        Ok(page)
    }
}

#[async_trait]
impl ChatHistory for SlackClient {
    async fn messages_since(&self, channel: &str, oldest: SlackTs) -> Result<Vec<SlackMessage>> {
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.history_page(channel, oldest, cursor.as_deref()).await?;
            pages += 1;
            tracing::debug!(
                "📨 slack page {}: {} messages (has_more: {})",
                pages,
                page.messages.len(),
                page.has_more
            );

            let next = page.next_cursor().map(str::to_string);
            messages.extend(page.messages);

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!(
            "📨 Fetched {} messages from {} in {} page(s)",
            messages.len(),
            channel,
            pages
        );
        Ok(messages)
    }
}
