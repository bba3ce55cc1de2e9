pub mod cache;
pub mod config;
pub mod dtos;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod repositories;

use std::sync::Arc;

use actix_web::web;

use crate::cache::QueryCache;
use crate::gateway::SupabaseGateway;
use crate::repositories::community_repository::CommunityRepository;
use crate::repositories::post_repository::PostRepository;

/// Shared application state: one gateway handle, the repositories built
/// on it, and the query cache.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<SupabaseGateway>,
    pub communities: CommunityRepository,
    pub posts: PostRepository,
    pub cache: QueryCache,
}

impl AppState {
    pub fn new(gateway: SupabaseGateway) -> Self {
        let gateway = Arc::new(gateway);
        Self {
            communities: CommunityRepository::new(gateway.clone()),
            posts: PostRepository::new(gateway.clone()),
            cache: QueryCache::new(),
            gateway,
        }
    }
}

/// Register every route on an actix `App` or test service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(handlers::post_handlers::list_posts)
            .service(handlers::post_handlers::create_post)
            .service(handlers::post_handlers::get_post)
            .service(handlers::community_handlers::list_communities)
            .service(handlers::community_handlers::create_community)
            .service(handlers::community_handlers::view_community),
    )
    .service(handlers::test_gateway);
}
