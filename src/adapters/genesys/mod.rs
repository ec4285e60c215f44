pub mod datatable;
pub mod users;

pub use datatable::GenesysDataTable;
pub use users::GenesysUserDirectory;

use crate::adapters::http::{ensure_success, send_with_retry, RetryPolicy};
use crate::utils::error::{Result, SyncError};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// SDK-style region names and the environment domain each one maps to.
const REGION_HOSTS: &[(&str, &str)] = &[
    ("us_east_1", "mypurecloud.com"),
    ("us_east_2", "use2.us-gov-pure.cloud"),
    ("us_west_2", "usw2.pure.cloud"),
    ("ca_central_1", "cac1.pure.cloud"),
    ("sa_east_1", "sae1.pure.cloud"),
    ("eu_central_1", "mypurecloud.de"),
    ("eu_central_2", "euc2.pure.cloud"),
    ("eu_west_1", "mypurecloud.ie"),
    ("eu_west_2", "euw2.pure.cloud"),
    ("me_central_1", "mec1.pure.cloud"),
    ("ap_south_1", "aps1.pure.cloud"),
    ("ap_southeast_2", "mypurecloud.com.au"),
    ("ap_northeast_1", "mypurecloud.jp"),
    ("ap_northeast_2", "apne2.pure.cloud"),
    ("ap_northeast_3", "apne3.pure.cloud"),
];

/// A Genesys Cloud environment, e.g. `mypurecloud.de`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesysRegion {
    domain: String,
}

impl GenesysRegion {
    /// Accepts a region name (`eu_central_1`, `eu-central-1`) or an environment domain.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim().trim_start_matches("https://").trim_start_matches("api.");
        let normalized = trimmed.to_ascii_lowercase().replace('-', "_");

        if let Some((_, host)) = REGION_HOSTS.iter().find(|(name, _)| *name == normalized) {
            return Ok(Self {
                domain: host.to_string(),
            });
        }

        let domain = trimmed.trim_end_matches('/').to_ascii_lowercase();
        let looks_like_domain = domain.contains('.')
            && domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !looks_like_domain {
            return Err(SyncError::InvalidConfigValueError {
                field: "GENESYS_REGION".to_string(),
                value: value.to_string(),
                reason: "Expected a region such as eu_central_1 or a domain such as mypurecloud.de"
                    .to_string(),
            });
        }
        Ok(Self { domain })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn api_base(&self) -> String {
        format!("https://api.{}", self.domain)
    }

    pub fn login_base(&self) -> String {
        format!("https://login.{}", self.domain)
    }
}

#[derive(Debug, Clone)]
pub struct GenesysSettings {
    pub client_id: String,
    pub client_secret: String,
    pub region: GenesysRegion,
    pub api_base: Option<String>,
    pub login_base: Option<String>,
    pub retry: RetryPolicy,
}

impl GenesysSettings {
    fn api_base(&self) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| self.region.api_base())
    }

    fn login_base(&self) -> String {
        self.login_base
            .clone()
            .unwrap_or_else(|| self.region.login_base())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// One page of a Genesys entity listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EntityPage<T> {
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
    #[serde(default)]
    pub page_count: Option<u32>,
}

/// Authenticated Genesys Cloud API client.
#[derive(Clone)]
pub struct GenesysClient {
    http: Client,
    api_base: String,
    token: String,
    retry: RetryPolicy,
}

impl GenesysClient {
    /// Client-credentials grant; the token is reused for the whole run.
    pub async fn authenticate(settings: &GenesysSettings) -> Result<Self> {
        let http = Client::new();
        let login_base = settings.login_base();
        let login_base = login_base.trim_end_matches('/');

        tracing::debug!("🔐 Requesting Genesys token from {}", login_base);
        let request = http
            .post(format!("{}/oauth/token", login_base))
            .basic_auth(&settings.client_id, Some(&settings.client_secret))
            .form(&[("grant_type", "client_credentials")]);

        let response = send_with_retry("genesys", request, &settings.retry).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::AuthError {
                message: format!("token endpoint returned {}: {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!(
            "🔐 Authenticated with Genesys Cloud (token valid for {}s)",
            token.expires_in.unwrap_or_default()
        );

        Ok(Self {
            http,
            api_base: settings.api_base().trim_end_matches('/').to_string(),
            token: token.access_token,
            retry: settings.retry.clone(),
        })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.token)
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        send_with_retry("genesys", request, &self.retry).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(self.request(Method::GET, path).query(query)).await?;
        let response = ensure_success("genesys", response).await?;
        Ok(response.json().await?)
    }

    /// Walks `pageNumber` from 1 up to `pageCount`, or until a short page when the
    /// response carries no count.
    pub(crate) async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        page_size: u32,
        extra: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut entities = Vec::new();
        let mut page_number = 1u32;

        loop {
            let mut query = vec![
                ("pageSize", page_size.to_string()),
                ("pageNumber", page_number.to_string()),
            ];
            query.extend(extra.iter().cloned());

            let page: EntityPage<T> = self.get_json(path, &query).await?;
            let received = page.entities.len();
            entities.extend(page.entities);
            tracing::debug!("📄 {} page {}: {} entities", path, page_number, received);

            // The server may cap pageSize, so a short page only ends the walk without pageCount.
            let last_page = match page.page_count {
                Some(count) => page_number >= count || received == 0,
                None => received < page_size as usize,
            };
            if last_page {
                break;
            }
            page_number += 1;
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_region_names_resolve_to_domains() {
        assert_eq!(
            GenesysRegion::parse("us_east_1").unwrap().domain(),
            "mypurecloud.com"
        );
        assert_eq!(
            GenesysRegion::parse("EU-CENTRAL-1").unwrap().api_base(),
            "https://api.mypurecloud.de"
        );
        assert_eq!(
            GenesysRegion::parse("mypurecloud.ie").unwrap().login_base(),
            "https://login.mypurecloud.ie"
        );
        assert_eq!(
            GenesysRegion::parse("https://api.euw2.pure.cloud/").unwrap().domain(),
            "euw2.pure.cloud"
        );
        assert!(GenesysRegion::parse("mars_1").is_err());
    }

    pub(crate) fn settings_for(server: &MockServer) -> GenesysSettings {
        GenesysSettings {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            region: GenesysRegion::parse("us_east_1").unwrap(),
            api_base: Some(server.base_url()),
            login_base: Some(server.base_url()),
            retry: RetryPolicy::no_wait(2),
        }
    }

    pub(crate) fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST)
                .path("/oauth/token")
                .header_exists("Authorization")
                .x_www_form_urlencoded_tuple("grant_type", "client_credentials");
            then.status(200).json_body(serde_json::json!({
                "access_token": "token-123",
                "token_type": "bearer",
                "expires_in": 86399
            }));
        })
    }

    #[tokio::test]
    async fn test_authenticate_and_page_through_entities() {
        let server = MockServer::start();
        let token = mock_token(&server);

        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/things")
                .header("Authorization", "Bearer token-123")
                .query_param("pageNumber", "1")
                .query_param("pageSize", "2");
            then.status(200).json_body(serde_json::json!({
                "entities": [{"id": "a"}, {"id": "b"}],
                "pageNumber": 1,
                "pageCount": 2
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/things")
                .query_param("pageNumber", "2");
            then.status(200).json_body(serde_json::json!({
                "entities": [{"id": "c"}, {"id": "d"}],
                "pageNumber": 2,
                "pageCount": 2
            }));
        });

        let client = GenesysClient::authenticate(&settings_for(&server)).await.unwrap();
        let things: Vec<serde_json::Value> =
            client.get_all_pages("/api/v2/things", 2, &[]).await.unwrap();

        token.assert();
        first.assert();
        second.assert();
        assert_eq!(things.len(), 4);
    }

    #[tokio::test]
    async fn test_page_count_wins_over_short_page() {
        let server = MockServer::start();
        mock_token(&server);

        // Server caps the page at one entity although 500 were requested.
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/rows")
                .query_param("pageNumber", "1")
                .query_param("pageSize", "500");
            then.status(200).json_body(serde_json::json!({
                "entities": [{"id": "a"}],
                "pageCount": 2
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/rows")
                .query_param("pageNumber", "2");
            then.status(200).json_body(serde_json::json!({
                "entities": [{"id": "b"}],
                "pageCount": 2
            }));
        });

        let client = GenesysClient::authenticate(&settings_for(&server)).await.unwrap();
        let rows: Vec<serde_json::Value> =
            client.get_all_pages("/api/v2/rows", 500, &[]).await.unwrap();

        first.assert();
        second.assert();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(401).body(r#"{"error":"invalid_client"}"#);
        });

        let err = GenesysClient::authenticate(&settings_for(&server))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SyncError::AuthError { .. }));
    }
}
