//! Supabase record store.
//!
//! Talks to the PostgREST API exposed at `{url}/rest/v1`. Every request
//! carries the service key both as `apikey` and as a bearer token.

use crate::error::{SyncError, SyncResult};
use crate::store::{RecordStore, StoreSide};
use async_trait::async_trait;
use mdx_types::{Record, RecordKey, TableSchema};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Supabase connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL (e.g. `https://xyz.supabase.co`).
    pub url: String,
    /// Service-role key.
    pub service_key: String,
    /// Rows per page when fetching a table.
    pub page_size: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            service_key: String::new(),
            page_size: 1000,
            timeout_secs: 30,
        }
    }
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
}

/// The remote store.
pub struct SupabaseStore {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseStore {
    /// Creates a client for the configured project.
    pub fn new(config: SupabaseConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// The active configuration.
    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.url.trim_end_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    async fn check(response: Response) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PostgrestError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(SyncError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

/// Parses the total out of a `Content-Range` header (`0-24/3573`, `*/0`).
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl RecordStore for SupabaseStore {
    fn side(&self) -> StoreSide {
        StoreSide::Remote
    }

    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn fetch_all(&self, table: &TableSchema) -> SyncResult<Vec<Record>> {
        let url = self.endpoint(table.remote_name);
        let order = format!("{}.asc", table.primary_key.remote);
        let page_size = self.config.page_size.max(1);
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let response = self
                .request(Method::GET, &url)
                .query(&[
                    ("select", "*".to_string()),
                    ("order", order.clone()),
                    ("limit", page_size.to_string()),
                    ("offset", offset.to_string()),
                ])
                .send()
                .await?;
            let page: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
            // The server may cap a page below `limit` (PostgREST `max-rows`),
            // so a short page is not the end of the table.
            if page.is_empty() {
                break;
            }
            let fetched = page.len();
            for row in page {
                records.push(Record::from_json(row)?);
            }
            debug!("Fetched {fetched} rows of {} at offset {offset}", table.remote_name);
            offset += fetched;
        }

        Ok(records)
    }

    async fn create(&self, table: &TableSchema, record: &Record) -> SyncResult<()> {
        let response = self
            .request(Method::POST, &self.endpoint(table.remote_name))
            .header("Prefer", "return=minimal")
            .json(&record.to_json())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(
        &self,
        table: &TableSchema,
        key: &RecordKey,
        record: &Record,
    ) -> SyncResult<()> {
        let pk = table.primary_key.remote;
        let url = format!(
            "{}?{pk}=eq.{}&select={pk}",
            self.endpoint(table.remote_name),
            urlencoding::encode(&key.to_string())
        );
        let response = self
            .request(Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .json(&record.to_json())
            .send()
            .await?;
        let updated: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
        if updated.is_empty() {
            return Err(SyncError::NotFound {
                table: table.remote_name.to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }

    async fn upsert(&self, table: &TableSchema, record: &Record) -> SyncResult<()> {
        let response = self
            .request(Method::POST, &self.endpoint(table.remote_name))
            .query(&[("on_conflict", table.primary_key.remote)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&record.to_json())
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn count(&self, table: &TableSchema) -> SyncResult<u64> {
        let response = self
            .request(Method::HEAD, &self.endpoint(table.remote_name))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                SyncError::Store(format!(
                    "count of {} returned no usable Content-Range",
                    table.remote_name
                ))
            })
    }
}
