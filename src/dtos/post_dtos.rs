use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreatePostDTO {
    pub title: String,
    pub content: String,
    pub avatar_url: Option<String>,
    pub community_id: Option<i64>,
    /// Required in practice; the handler rejects requests without it
    /// before anything touches the network.
    pub image: Option<ImageUploadDTO>,
}

#[derive(Debug, Deserialize)]
pub struct ImageUploadDTO {
    /// Base64-encoded bytes, optionally with a `data:` URL prefix.
    pub image_data: String,
    pub file_name: String,
    pub content_type: String,
}
