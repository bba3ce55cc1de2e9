use actix_web::{get, post, web, HttpResponse};
use base64::{engine::general_purpose, Engine as _};
use log::info;

use crate::cache::QueryKey;
use crate::dtos::post_dtos::{CreatePostDTO, ImageUploadDTO};
use crate::error::ApiError;
use crate::models::post::{NewPost, Post};
use crate::repositories::post_repository::ImageBlob;
use crate::AppState;

use super::ApiResponse;

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

#[get("/posts")]
pub async fn list_posts(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let repo = state.posts.clone();
    let posts: Vec<Post> = state
        .cache
        .get_or_fetch(QueryKey::RecentPosts, move || async move {
            let rows = repo.recent_posts().await?;
            Ok(serde_json::to_value(rows)?)
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Posts retrieved successfully", posts)))
}

#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let repo = state.posts.clone();
    let post: Post = state
        .cache
        .get_or_fetch(QueryKey::Post(id), move || async move {
            let row = repo.post_by_id(id).await?;
            Ok(serde_json::to_value(row)?)
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Post retrieved successfully", post)))
}

#[post("/posts")]
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostDTO>,
) -> Result<HttpResponse, ApiError> {
    let CreatePostDTO {
        title,
        content,
        avatar_url,
        community_id,
        image,
    } = body.into_inner();

    // Surface-level guard: nothing touches the network without an image.
    let image = image.ok_or_else(|| ApiError::Validation("An image file is required".to_string()))?;

    let input = NewPost {
        title,
        content,
        avatar_url,
        community_id,
    };
    input.validate().map_err(ApiError::Validation)?;
    let blob = decode_image(image)?;

    let created = state.posts.create_post(input, blob).await?;

    // List views must not serve stale results after this mutation.
    state.cache.invalidate(&QueryKey::RecentPosts).await;
    if let Some(community_id) = created.community_id {
        state
            .cache
            .invalidate(&QueryKey::CommunityPosts(community_id))
            .await;
    }

    info!("created post {}", created.id);
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Post created successfully", created)))
}

fn decode_image(image: ImageUploadDTO) -> Result<ImageBlob, ApiError> {
    let parsed: mime::Mime = image
        .content_type
        .parse()
        .map_err(|_| ApiError::Validation("Unrecognized content type".to_string()))?;
    if parsed.type_() != mime::IMAGE || !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str())
    {
        return Err(ApiError::Validation(
            "Invalid file type. Only JPEG, PNG, GIF, and WEBP are allowed.".to_string(),
        ));
    }

    // Strip a data URL prefix (data:image/png;base64,) when present.
    let raw = image.image_data.as_str();
    let encoded = if raw.contains(',') {
        raw.split(',').nth(1).unwrap_or(raw)
    } else {
        raw
    };

    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| ApiError::Validation("Invalid base64 image data".to_string()))?;

    Ok(ImageBlob {
        file_name: image.file_name,
        content_type: image.content_type,
        bytes,
    })
}
