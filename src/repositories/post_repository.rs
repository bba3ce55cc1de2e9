use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use serde_json::json;

use crate::gateway::{GatewayError, SupabaseGateway};
use crate::models::post::{NewPost, Post, PostWithCommunity};

pub const POST_IMAGE_BUCKET: &str = "post-images";

/// Image blob accompanying a new post, already decoded from the wire.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct PostRepository {
    gateway: Arc<SupabaseGateway>,
}

impl PostRepository {
    pub fn new(gateway: Arc<SupabaseGateway>) -> Self {
        Self { gateway }
    }

    /// All posts, newest first.
    pub async fn recent_posts(&self) -> Result<Vec<Post>, GatewayError> {
        self.gateway
            .from("posts")
            .select("*")
            .order_desc("created_at")
            .fetch()
            .await
    }

    /// Posts in one community, newest first, with the parent community's
    /// name expanded onto each row.
    pub async fn community_posts(
        &self,
        community_id: i64,
    ) -> Result<Vec<PostWithCommunity>, GatewayError> {
        self.gateway
            .from("posts")
            .select("*,communities(name)")
            .eq("community_id", community_id)
            .order_desc("created_at")
            .fetch()
            .await
    }

    pub async fn post_by_id(&self, id: i64) -> Result<Post, GatewayError> {
        self.gateway
            .from("posts")
            .select("*")
            .eq("id", id)
            .fetch_one()
            .await
    }

    /// Two-step creation: upload the image blob, then insert the row
    /// pointing at the blob's public URL.
    pub async fn create_post(&self, input: NewPost, image: ImageBlob) -> Result<Post, GatewayError> {
        let object_path = object_path_for(&image.file_name, Utc::now().timestamp_millis());

        self.gateway
            .upload_object(
                POST_IMAGE_BUCKET,
                &object_path,
                image.bytes,
                &image.content_type,
            )
            .await?;
        let image_url = self.gateway.public_object_url(POST_IMAGE_BUCKET, &object_path);

        let payload = json!({
            "title": input.title,
            "content": input.content,
            "avatar_url": input.avatar_url,
            "community_id": input.community_id,
            "image_url": image_url,
        });
        self.gateway.insert("posts", &payload).await
    }
}

/// Object name: upload timestamp in milliseconds plus the sanitized
/// original filename. Two uploads of the same filename within one
/// millisecond collide; the remote's behavior for that case is
/// unspecified and left that way.
fn object_path_for(file_name: &str, millis: i64) -> String {
    let unsafe_chars = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
    let safe = unsafe_chars.replace_all(file_name, "_");
    format!("{}-{}", millis, safe)
}
