use super::GenesysClient;
use crate::adapters::http::ensure_success;
use crate::domain::model::{EmailAddress, InsertOutcome};
use crate::domain::ports::BlacklistTable;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Primary key column every Architect data table has.
pub const KEY_COLUMN: &str = "key";
pub const DEFAULT_EMAIL_COLUMN: &str = "EmailAddress";

/// An Architect data table used as an email blacklist.
pub struct GenesysDataTable {
    client: GenesysClient,
    table_id: String,
    email_column: String,
    page_size: u32,
}

impl GenesysDataTable {
    pub fn new(client: GenesysClient, table_id: &str, email_column: &str, page_size: u32) -> Self {
        Self {
            client,
            table_id: table_id.to_string(),
            email_column: email_column.to_string(),
            page_size,
        }
    }

    fn rows_path(&self) -> String {
        format!("/api/v2/flows/datatables/{}/rows", self.table_id)
    }

    fn row_body(&self, email: &EmailAddress) -> Value {
        let mut row = Map::new();
        row.insert(KEY_COLUMN.to_string(), Value::String(email.to_string()));
        if self.email_column != KEY_COLUMN {
            row.insert(self.email_column.clone(), Value::String(email.to_string()));
        }
        Value::Object(row)
    }
}

#[async_trait]
impl BlacklistTable for GenesysDataTable {
    async fn existing_emails(&self) -> Result<HashSet<String>> {
        let rows: Vec<Map<String, Value>> = self
            .client
            .get_all_pages(
                &self.rows_path(),
                self.page_size,
                &[("showbrief", "false".to_string())],
            )
            .await?;

        let total = rows.len();
        let emails: HashSet<String> = rows
            .iter()
            .filter_map(|row| row.get(&self.email_column)?.as_str())
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();

        if emails.len() < total {
            tracing::debug!(
                "🗂️ {} of {} rows carry no '{}' value or repeat one",
                total - emails.len(),
                total,
                self.email_column
            );
        }
        Ok(emails)
    }

    async fn insert_email(&self, email: &EmailAddress) -> Result<InsertOutcome> {
        let request = self
            .client
            .request(Method::POST, &self.rows_path())
            .json(&self.row_body(email));
        let response = self.client.send(request).await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!("🗂️ {} already present (409)", email);
            return Ok(InsertOutcome::AlreadyExists);
        }

        ensure_success("genesys", response).await.map_err(|err| match err {
            SyncError::ApiError {
                service,
                status,
                message,
            } => SyncError::ApiError {
                service,
                status,
                message: format!("inserting {}: {}", email, message),
            },
            other => other,
        })?;
        Ok(InsertOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::genesys::tests::{mock_token, settings_for};
    use httpmock::prelude::*;

    async fn table_for(server: &MockServer, email_column: &str) -> GenesysDataTable {
        mock_token(server);
        let client = GenesysClient::authenticate(&settings_for(server))
            .await
            .unwrap();
        GenesysDataTable::new(client, "dt-1", email_column, 2)
    }

    #[tokio::test]
    async fn test_existing_emails_reads_every_page() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/flows/datatables/dt-1/rows")
                .query_param("showbrief", "false")
                .query_param("pageNumber", "1");
            then.status(200).json_body(serde_json::json!({
                "entities": [
                    {"key": "a@example.com", "EmailAddress": "A@Example.com"},
                    {"key": "legacy"}
                ],
                "pageCount": 2
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/flows/datatables/dt-1/rows")
                .query_param("pageNumber", "2");
            then.status(200).json_body(serde_json::json!({
                "entities": [{"key": "b@example.com", "EmailAddress": "b@example.com"}],
                "pageCount": 2
            }));
        });

        let table = table_for(&server, DEFAULT_EMAIL_COLUMN).await;
        let emails = table.existing_emails().await.unwrap();

        first.assert();
        second.assert();
        assert_eq!(emails.len(), 2);
        assert!(emails.contains("a@example.com"));
        assert!(emails.contains("b@example.com"));
    }

    #[tokio::test]
    async fn test_insert_sends_key_and_email_column() {
        let server = MockServer::start();
        let insert = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/flows/datatables/dt-1/rows")
                .json_body(serde_json::json!({
                    "key": "new@example.com",
                    "EmailAddress": "new@example.com"
                }));
            then.status(200).json_body(serde_json::json!({"key": "new@example.com"}));
        });

        let table = table_for(&server, DEFAULT_EMAIL_COLUMN).await;
        let email = EmailAddress::from_normalized("new@example.com".to_string());
        assert_eq!(table.insert_email(&email).await.unwrap(), InsertOutcome::Inserted);
        insert.assert();
    }

    #[tokio::test]
    async fn test_insert_conflict_means_present() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/flows/datatables/dt-1/rows");
            then.status(409).body(r#"{"code":"flows.datatables.row.already.exists"}"#);
        });

        let table = table_for(&server, KEY_COLUMN).await;
        let email = EmailAddress::from_normalized("dup@example.com".to_string());
        assert_eq!(
            table.insert_email(&email).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
    }

    #[tokio::test]
    async fn test_insert_failure_names_the_email() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/flows/datatables/dt-1/rows");
            then.status(400).body("schema mismatch");
        });

        let table = table_for(&server, DEFAULT_EMAIL_COLUMN).await;
        let email = EmailAddress::from_normalized("x@example.com".to_string());
        let err = table.insert_email(&email).await.unwrap_err();
        assert!(err.to_string().contains("x@example.com"));
    }
}
