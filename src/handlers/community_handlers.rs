use actix_web::{get, post, web, HttpResponse};
use futures::future;
use log::info;

use crate::cache::QueryKey;
use crate::dtos::community_dtos::{CommunityViewOut, CreateCommunityDTO};
use crate::error::ApiError;
use crate::models::community::{Community, NewCommunity};
use crate::models::post::PostWithCommunity;
use crate::AppState;

use super::ApiResponse;

#[get("/communities")]
pub async fn list_communities(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let repo = state.communities.clone();
    let communities: Vec<Community> = state
        .cache
        .get_or_fetch(QueryKey::Communities, move || async move {
            let rows = repo.list_communities().await?;
            Ok(serde_json::to_value(rows)?)
        })
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Communities retrieved successfully",
        communities,
    )))
}

#[post("/communities")]
pub async fn create_community(
    state: web::Data<AppState>,
    body: web::Json<CreateCommunityDTO>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let input = NewCommunity {
        name: body.name,
        description: body.description,
    };
    input.validate().map_err(ApiError::Validation)?;

    let created = state.communities.create_community(input).await?;
    state.cache.invalidate(&QueryKey::Communities).await;

    info!("created community {}", created.id);
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Community created successfully", created)))
}

/// Single-community view: the community's posts and its display name.
/// Both queries run concurrently, each under its own cache key.
#[get("/communities/{id}")]
pub async fn view_community(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let posts_fut = {
        let cache = state.cache.clone();
        let repo = state.posts.clone();
        async move {
            cache
                .get_or_fetch::<Vec<PostWithCommunity>, _, _>(
                    QueryKey::CommunityPosts(id),
                    move || async move {
                        let rows = repo.community_posts(id).await?;
                        Ok(serde_json::to_value(rows)?)
                    },
                )
                .await
        }
    };
    let name_fut = {
        let cache = state.cache.clone();
        let repo = state.communities.clone();
        async move {
            cache
                .get_or_fetch::<String, _, _>(QueryKey::CommunityName(id), move || async move {
                    let name = repo.community_name(id).await?;
                    Ok(serde_json::to_value(name)?)
                })
                .await
        }
    };

    let (posts, fallback_name) = future::try_join(posts_fut, name_fut).await?;

    // Prefer the name expanded onto the first post; fall back to the
    // direct lookup when the community has no posts yet.
    let name = posts
        .first()
        .and_then(|p| p.community_name())
        .map(str::to_string)
        .unwrap_or(fallback_name);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Community retrieved successfully",
        CommunityViewOut { name, posts },
    )))
}
