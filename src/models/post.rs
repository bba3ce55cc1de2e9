use serde::{Deserialize, Serialize};

/// Row of the remote `posts` table. Timestamps stay as the remote's
/// ISO-8601 strings; nullable columns are explicit options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub avatar_url: Option<String>,
    pub community_id: Option<i64>,
    pub created_at: Option<String>,
}

/// Join-expanded parent community, present only when the row has a
/// community and the query asked for the expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityRef {
    pub name: String,
}

/// A post joined with its parent community's name at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithCommunity {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub avatar_url: Option<String>,
    pub community_id: Option<i64>,
    pub created_at: Option<String>,
    pub communities: Option<CommunityRef>,
}

impl PostWithCommunity {
    pub fn community_name(&self) -> Option<&str> {
        self.communities.as_ref().map(|c| c.name.as_str())
    }
}

/// Fields the client supplies when creating a post. The image travels
/// separately as a blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub avatar_url: Option<String>,
    pub community_id: Option<i64>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Post title cannot be empty".to_string());
        }
        if self.title.len() > 200 {
            return Err("Post title must be at most 200 characters".to_string());
        }
        if self.content.trim().is_empty() {
            return Err("Post content cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_name_requires_presence() {
        let post = PostWithCommunity {
            id: 1,
            title: "Hello".to_string(),
            content: "World".to_string(),
            image_url: None,
            avatar_url: None,
            community_id: None,
            created_at: None,
            communities: None,
        };
        assert_eq!(post.community_name(), None);

        let post = PostWithCommunity {
            communities: Some(CommunityRef {
                name: "rustaceans".to_string(),
            }),
            community_id: Some(4),
            ..post
        };
        assert_eq!(post.community_name(), Some("rustaceans"));
    }

    #[test]
    fn new_post_requires_title_and_content() {
        let post = NewPost {
            title: "Hello".to_string(),
            content: "World".to_string(),
            avatar_url: None,
            community_id: Some(4),
        };
        assert!(post.validate().is_ok());

        let blank_title = NewPost {
            title: " ".to_string(),
            ..post.clone()
        };
        assert!(blank_title.validate().is_err());

        let blank_content = NewPost {
            content: String::new(),
            ..post
        };
        assert!(blank_content.validate().is_err());
    }
}
