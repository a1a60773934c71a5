pub mod auth;
pub mod client;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;
pub mod views;

use axum::{
    Json, Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, store::ForumStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ForumStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn ForumStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let api_routes = Router::new()
        .route("/api/posts", get(handlers::posts::get_posts))
        .route("/api/forum", post(handlers::forums::create_forum))
        .route("/api/forum/subscribe", post(handlers::forums::subscribe))
        .route("/api/forum/unsubscribe", post(handlers::forums::unsubscribe))
        .route("/api/forum/post/create", post(handlers::posts::create_post))
        .route("/api/forum/post/vote", patch(handlers::posts::vote_post))
        .route(
            "/api/forum/post/comment",
            post(handlers::comments::create_comment),
        )
        .route(
            "/api/forum/comment/vote",
            patch(handlers::comments::vote_comment),
        )
        .route("/api/forums/top", get(handlers::forums::top_communities))
        .route("/api/user", patch(handlers::users::update_profile));

    let page_routes = Router::new()
        .route("/", get(handlers::pages::home))
        .route("/c/{slug}", get(handlers::pages::community))
        .route("/d/{forum_name}", get(handlers::pages::forum))
        .route("/d/{forum_name}/post/{post_id}", get(handlers::pages::post))
        .route("/u/{username}", get(handlers::pages::profile));

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .merge(page_routes)
        .fallback(handlers::pages::fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now()
    }))
}
