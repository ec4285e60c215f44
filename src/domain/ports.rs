use crate::domain::model::{Division, EmailAddress, GenesysUser, InsertOutcome, SlackMessage, SlackTs};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

pub trait Storage: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `path` yet.
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Chat history of a single channel.
#[async_trait]
pub trait ChatHistory: Send + Sync {
    /// Every message strictly newer than `oldest`, across all pages.
    async fn messages_since(&self, channel: &str, oldest: SlackTs) -> Result<Vec<SlackMessage>>;
}

/// The remote blacklist data table.
#[async_trait]
pub trait BlacklistTable: Send + Sync {
    /// Lowercased email column of every row, across all pages.
    async fn existing_emails(&self) -> Result<HashSet<String>>;
    async fn insert_email(&self, email: &EmailAddress) -> Result<InsertOutcome>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn divisions(&self) -> Result<Vec<Division>>;
    async fn users(&self) -> Result<Vec<GenesysUser>>;
    async fn set_preferred_name(&self, user: &GenesysUser, preferred_name: &str) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Plan: Send;
    type Output: Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Plan>;
    async fn load(&self, plan: Self::Plan) -> Result<Self::Output>;
}
