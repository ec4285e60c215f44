use super::GenesysClient;
use crate::adapters::http::ensure_success;
use crate::domain::model::{Division, GenesysUser};
use crate::domain::ports::UserDirectory;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Method;

pub const USERS_PAGE_SIZE: u32 = 100;

pub struct GenesysUserDirectory {
    client: GenesysClient,
    page_size: u32,
}

impl GenesysUserDirectory {
    pub fn new(client: GenesysClient) -> Self {
        Self {
            client,
            page_size: USERS_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl UserDirectory for GenesysUserDirectory {
    async fn divisions(&self) -> Result<Vec<Division>> {
        let divisions: Vec<Division> = self
            .client
            .get_all_pages("/api/v2/authorization/divisions", self.page_size, &[])
            .await?;
        tracing::info!("🏢 Found {} divisions", divisions.len());
        Ok(divisions)
    }

    async fn users(&self) -> Result<Vec<GenesysUser>> {
        let users: Vec<GenesysUser> = self
            .client
            .get_all_pages("/api/v2/users", self.page_size, &[])
            .await?;
        tracing::info!("👥 Retrieved {} users", users.len());
        Ok(users)
    }

    async fn set_preferred_name(&self, user: &GenesysUser, preferred_name: &str) -> Result<()> {
        // The API rejects a patch without the current version.
        let version = user.version.ok_or_else(|| SyncError::ProcessingError {
            message: format!("user {} has no version; cannot patch", user.id),
        })?;

        let request = self
            .client
            .request(Method::PATCH, &format!("/api/v2/users/{}", user.id))
            .json(&serde_json::json!({
                "preferredName": preferred_name,
                "version": version,
            }));
        let response = self.client.send(request).await?;
        ensure_success("genesys", response).await?;
        Ok(())
    }
}
