use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::OptionalAuthUser,
    error::Result,
    models::FeedQuery,
    services::{forum_service, post_service, user_service},
    views::{
        FeedMeta, ForumTemplate, HomeTemplate, NotFoundTemplate, PostCard, PostTemplate,
        ProfileTemplate, initial_json,
    },
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub tag: Option<String>,
}

fn viewer_name(viewer: &OptionalAuthUser) -> Option<String> {
    viewer.0.as_ref().map(|user| user.username.clone())
}

fn render<T: Template>(template: T) -> Result<Response> {
    Ok(Html(template.render()?).into_response())
}

pub fn not_found_page(viewer_name: Option<String>, message: &str) -> Result<Response> {
    let html = NotFoundTemplate {
        viewer_name,
        message: message.to_string(),
    }
    .render()?;

    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

pub async fn home(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Query(params): Query<PageQuery>,
) -> Result<Response> {
    let store = state.store.as_ref();
    let query = FeedQuery::page(1, state.config.pagination_results).with_tag(params.tag.as_deref());

    let (posts, top_communities) = tokio::try_join!(
        post_service::get_posts(store, &query),
        forum_service::get_top_communities(store, state.config.top_communities_limit),
    )?;

    render(HomeTemplate {
        viewer_name: viewer_name(&viewer),
        posts: PostCard::many(&posts, viewer.user_id(), &state.config.app_url),
        feed: FeedMeta {
            forum_name: String::new(),
            tag: query.tag.clone().unwrap_or_default(),
            page_size: state.config.pagination_results,
            initial_json: initial_json(&posts)?,
        },
        top_communities,
    })
}

async fn forum_page(
    state: &AppState,
    viewer: &OptionalAuthUser,
    forum_name: &str,
    prefix: &str,
    tag: Option<&str>,
) -> Result<Response> {
    let details = forum_service::get_forum(
        state.store.as_ref(),
        forum_name,
        viewer.user_id(),
        tag,
        state.config.pagination_results,
    )
    .await?;

    let Some(details) = details else {
        return not_found_page(viewer_name(viewer), "This community does not exist.");
    };

    let normalized_tag = FeedQuery::default().with_tag(tag).tag;
    render(ForumTemplate::new(
        &details,
        viewer_name(viewer),
        viewer.user_id(),
        prefix,
        normalized_tag.as_deref(),
        &state.config.app_url,
        state.config.pagination_results,
    )?)
}

pub async fn forum(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(forum_name): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Response> {
    forum_page(&state, &viewer, &forum_name, "d", params.tag.as_deref()).await
}

pub async fn community(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(slug): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Response> {
    forum_page(&state, &viewer, &slug, "c", params.tag.as_deref()).await
}

pub async fn post(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path((forum_name, post_id)): Path<(String, String)>,
) -> Result<Response> {
    let Ok(post_id) = Uuid::parse_str(&post_id) else {
        return not_found_page(viewer_name(&viewer), "This post does not exist.");
    };

    let Some((post, threads)) =
        post_service::get_post_page(state.store.as_ref(), &forum_name, post_id).await?
    else {
        return not_found_page(viewer_name(&viewer), "This post does not exist.");
    };

    render(PostTemplate::new(
        &post,
        &threads,
        viewer_name(&viewer),
        viewer.user_id(),
        &state.config.app_url,
    ))
}

pub async fn profile(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(username): Path<String>,
) -> Result<Response> {
    let profile = user_service::get_profile(
        state.store.as_ref(),
        &username,
        state.config.pagination_results,
    )
    .await?;

    let Some((user, posts)) = profile else {
        return not_found_page(viewer_name(&viewer), "This user does not exist.");
    };

    render(ProfileTemplate::new(
        &user,
        &posts,
        viewer_name(&viewer),
        viewer.user_id(),
        &state.config.app_url,
    ))
}

pub async fn fallback(viewer: OptionalAuthUser) -> Result<Response> {
    not_found_page(viewer_name(&viewer), "This page does not exist.")
}
