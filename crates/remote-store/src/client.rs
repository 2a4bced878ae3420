//! REST client for the hosted remote store.
//!
//! The store exposes each table through a PostgREST-style endpoint under
//! `/rest/v1/{table}`; the same credential is sent as `apikey` and as a bearer
//! token.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{RemoteStoreError, Result};

/// Default timeout for requests. The facade applies its own, usually shorter, deadline.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;
const REST_PATH: &str = "rest/v1";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl ApiErrorResponse {
    fn describe(&self) -> String {
        let mut text = match &self.code {
            Some(code) => format!("{}: {}", code, self.message),
            None => self.message.clone(),
        };
        if let Some(hint) = &self.hint {
            text.push_str(&format!(" (hint: {})", hint));
        }
        text
    }
}

#[derive(Debug, Clone)]
pub struct RemoteStoreClient {
    client: reqwest::Client,
    base_url: String,
    credential: String,
}

impl RemoteStoreClient {
    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("Remote store response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("Remote store error ({}): {}", status, preview);
    }

    /// Create a client for the store at `endpoint` (e.g. "https://xyz.supabase.co").
    pub fn new(endpoint: &str, credential: &str) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(RemoteStoreError::invalid_config("endpoint is empty"));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(RemoteStoreError::invalid_config(format!(
                "endpoint must be an http(s) URL, got {}",
                endpoint
            )));
        }
        if credential.trim().is_empty() {
            return Err(RemoteStoreError::invalid_config("credential is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: endpoint.to_string(),
            credential: credential.trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let key_value = HeaderValue::from_str(&self.credential)
            .map_err(|_| RemoteStoreError::invalid_config("Invalid credential format"))?;
        headers.insert("apikey", key_value);

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.credential))
            .map_err(|_| RemoteStoreError::invalid_config("Invalid credential format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn error_from(status: reqwest::StatusCode, body: &str) -> RemoteStoreError {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            return RemoteStoreError::api(status.as_u16(), error.describe());
        }
        RemoteStoreError::api(status.as_u16(), format!("Request failed: {}", body))
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::error_from(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Check the status of a response whose body is not needed.
    async fn expect_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::error_from(status, &body));
        }
        Ok(())
    }

    /// All rows of `table`.
    ///
    /// GET /rest/v1/{table}?select=*
    pub async fn select_all(&self, table: &str) -> Result<Vec<Value>> {
        let url = self.table_url(table);
        debug!("Fetching all rows from {}", table);

        let response = self
            .client
            .get(&url)
            .query(&[("select", "*")])
            .headers(self.headers()?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Insert rows, replacing existing ones with the same primary key.
    ///
    /// POST /rest/v1/{table}
    pub async fn upsert_rows(&self, table: &str, rows: &[Value]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.table_url(table);
        debug!("Upserting {} row(s) into {}", rows.len(), table);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .header("Prefer", MERGE_DUPLICATES)
            .json(rows)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    /// Delete the row whose `id` equals `id`.
    ///
    /// DELETE /rest/v1/{table}?id=eq.{id}
    pub async fn delete_row(&self, table: &str, id: &str) -> Result<()> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(table),
            urlencoding::encode(id)
        );
        debug!("Deleting row {} from {}", id, table);

        let response = self
            .client
            .delete(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        Self::expect_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unusable_configuration() {
        assert!(matches!(
            RemoteStoreClient::new("", "key"),
            Err(RemoteStoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            RemoteStoreClient::new("xyz.supabase.co", "key"),
            Err(RemoteStoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            RemoteStoreClient::new("https://xyz.supabase.co", "  "),
            Err(RemoteStoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn table_urls_ignore_trailing_slash() {
        let client = RemoteStoreClient::new("https://xyz.supabase.co/", "key").unwrap();
        assert_eq!(
            client.table_url("deals"),
            "https://xyz.supabase.co/rest/v1/deals"
        );
    }

    #[test]
    fn postgrest_error_body_is_described() {
        let body: ApiErrorResponse = serde_json::from_str(
            r#"{"code":"42P01","message":"relation \"public.deals\" does not exist","hint":null}"#,
        )
        .unwrap();
        assert_eq!(
            body.describe(),
            "42P01: relation \"public.deals\" does not exist"
        );
    }
}
