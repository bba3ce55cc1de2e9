use std::env;

use anyhow::{Context, Result};

/// Connection settings for the remote data gateway (PostgREST + storage).
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Project base URL, e.g. https://xyz.supabase.co
    pub base_url: String,
    /// Server-only key, sent as the Authorization bearer.
    pub service_role_key: String,
    /// Optional public key, sent as `apikey` when present.
    pub anon_key: Option<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("SUPABASE_URL")
            .context("SUPABASE_URL not set")?
            .trim()
            .trim_end_matches('/')
            .to_string();
        let service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .context("SUPABASE_SERVICE_ROLE_KEY not set")?
            .trim()
            .to_string();
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self {
            base_url,
            service_role_key,
            anon_key,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub allowed_origins: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into());

        Self {
            bind_address: format!("0.0.0.0:{}", port),
            allowed_origins,
        }
    }
}
