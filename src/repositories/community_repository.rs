use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::gateway::{GatewayError, SupabaseGateway};
use crate::models::community::{Community, NewCommunity};

#[derive(Clone)]
pub struct CommunityRepository {
    gateway: Arc<SupabaseGateway>,
}

#[derive(Debug, Deserialize)]
struct NameRow {
    name: String,
}

impl CommunityRepository {
    pub fn new(gateway: Arc<SupabaseGateway>) -> Self {
        Self { gateway }
    }

    /// All communities, newest first.
    pub async fn list_communities(&self) -> Result<Vec<Community>, GatewayError> {
        self.gateway
            .from("communities")
            .select("*")
            .order_desc("created_at")
            .fetch()
            .await
    }

    /// Display name of one community, looked up by id.
    pub async fn community_name(&self, id: i64) -> Result<String, GatewayError> {
        let row: NameRow = self
            .gateway
            .from("communities")
            .select("name")
            .eq("id", id)
            .fetch_one()
            .await?;
        Ok(row.name)
    }

    pub async fn create_community(&self, input: NewCommunity) -> Result<Community, GatewayError> {
        let payload = json!({
            "name": input.name,
            "description": input.description,
        });
        self.gateway.insert("communities", &payload).await
    }
}
