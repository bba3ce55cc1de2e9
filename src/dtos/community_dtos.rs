use serde::{Deserialize, Serialize};

use crate::models::post::PostWithCommunity;

#[derive(Debug, Deserialize)]
pub struct CreateCommunityDTO {
    pub name: String,
    pub description: String,
}

/// Payload of the single-community view: resolved display name plus the
/// community's posts, newest first.
#[derive(Debug, Serialize)]
pub struct CommunityViewOut {
    pub name: String,
    pub posts: Vec<PostWithCommunity>,
}
