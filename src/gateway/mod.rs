use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::GatewayConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("remote operation failed: {0}")]
    Remote(String),
    #[error("not found")]
    NotFound,
}

/// Handle to the remote backend: PostgREST tables plus object storage.
/// Constructed once from config and injected into repositories; never a
/// process-wide global.
#[derive(Clone)]
pub struct SupabaseGateway {
    client: Client,
    base_url: String,
    rest_url: String,
    service_role_key: String,
    anon_key: Option<String>,
}

impl SupabaseGateway {
    pub fn new(config: &GatewayConfig, client: Client) -> Self {
        let base_url = config
            .base_url
            .trim_end_matches('/')
            .trim_end_matches("/rest/v1")
            .trim_end_matches('/')
            .to_string();
        let rest_url = format!("{}/rest/v1", base_url);

        Self {
            client,
            base_url,
            rest_url,
            service_role_key: config.service_role_key.clone(),
            anon_key: config.anon_key.clone(),
        }
    }

    /// Start a row query against a named table.
    pub fn from(&self, table: &str) -> TableQuery<'_> {
        TableQuery {
            gateway: self,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Insert one row and return the representation the remote sends back.
    pub async fn insert<T, P>(&self, table: &str, payload: &P) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.rest_url, table);
        debug!("gateway insert: {}", url);

        let resp = self
            .authed(self.client.post(&url))
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Remote(format!("{} -> {}", status.as_u16(), body)));
        }

        // PostgREST returns the representation as an array.
        let rows: Vec<T> = serde_json::from_str(&body)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::Remote("empty representation from insert".to_string()))
    }

    /// Upload a blob under `bucket/path`.
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        debug!("gateway upload: {}", url);

        let resp = self
            .authed(self.client.post(&url))
            .header(CONTENT_TYPE, content_type.to_string())
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Remote(format!("{} -> {}", status.as_u16(), body)));
        }
        Ok(())
    }

    /// Stable public URL for a previously uploaded object.
    pub fn public_object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        // apikey is required by the remote; fall back to the service key
        // when no anon key is configured.
        let apikey = self.anon_key.as_deref().unwrap_or(&self.service_role_key);
        req.header("apikey", apikey.to_string())
            .header(AUTHORIZATION, format!("Bearer {}", self.service_role_key))
    }
}

/// Builder for a PostgREST select: equality filters, ordering, join-style
/// field expansion, limit.
pub struct TableQuery<'g> {
    gateway: &'g SupabaseGateway,
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Option<String>,
    limit: Option<u32>,
}

impl<'g> TableQuery<'g> {
    /// Column list, including expansions like `*,communities(name)`.
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(format!("{}.desc", column));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref sel) = self.select {
            parts.push(format!("select={}", sel));
        }
        for (column, value) in &self.filters {
            parts.push(format!("{}=eq.{}", column, urlencoding::encode(value)));
        }
        if let Some(ref order) = self.order {
            parts.push(format!("order={}", order));
        }
        if let Some(n) = self.limit {
            parts.push(format!("limit={}", n));
        }
        parts.join("&")
    }

    /// Run the query and decode all rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, GatewayError> {
        let qs = self.query_string();
        let url = if qs.is_empty() {
            format!("{}/{}", self.gateway.rest_url, self.table)
        } else {
            format!("{}/{}?{}", self.gateway.rest_url, self.table, qs)
        };
        debug!("gateway select: {}", url);

        let resp = self
            .gateway
            .authed(self.gateway.client.get(&url))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Remote(format!("{} -> {}", status.as_u16(), body)));
        }

        let rows: Vec<T> = serde_json::from_str(&body)?;
        Ok(rows)
    }

    /// Run the query and decode the first row; empty result is `NotFound`.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        let rows: Vec<T> = self.fetch().await?;
        rows.into_iter().next().ok_or(GatewayError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_gateway(base: &str) -> SupabaseGateway {
        let config = GatewayConfig {
            base_url: base.to_string(),
            service_role_key: "service-key".to_string(),
            anon_key: None,
        };
        SupabaseGateway::new(&config, Client::new())
    }

    #[test]
    fn rest_url_derived_once() {
        let gw = test_gateway("https://xyz.supabase.co/");
        assert_eq!(gw.rest_url, "https://xyz.supabase.co/rest/v1");

        let gw = test_gateway("https://xyz.supabase.co/rest/v1");
        assert_eq!(gw.rest_url, "https://xyz.supabase.co/rest/v1");
    }

    #[test]
    fn query_string_assembles_filters_order_and_expansion() {
        let gw = test_gateway("https://xyz.supabase.co");
        let qs = gw
            .from("posts")
            .select("*,communities(name)")
            .eq("community_id", 4)
            .order_desc("created_at")
            .query_string();
        assert_eq!(
            qs,
            "select=*,communities(name)&community_id=eq.4&order=created_at.desc"
        );
    }

    #[test]
    fn filter_values_are_url_encoded() {
        let gw = test_gateway("https://xyz.supabase.co");
        let qs = gw.from("communities").eq("name", "a b&c").query_string();
        assert_eq!(qs, "name=eq.a%20b%26c");
    }

    #[test]
    fn public_object_url_format() {
        let gw = test_gateway("https://xyz.supabase.co");
        assert_eq!(
            gw.public_object_url("post-images", "123-cat.png"),
            "https://xyz.supabase.co/storage/v1/object/public/post-images/123-cat.png"
        );
    }
}
