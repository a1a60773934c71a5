use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    models::{CreateForumRequest, Forum, SubscriptionRequest, TopCommunity},
    services::forum_service,
    validation::ValidatedJson,
};

pub async fn create_forum(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateForumRequest>,
) -> Result<(StatusCode, Json<Forum>)> {
    let forum =
        forum_service::create_forum(state.store.as_ref(), auth_user.user_id, &payload.name).await?;

    Ok((StatusCode::CREATED, Json(forum)))
}

pub async fn subscribe(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<SubscriptionRequest>,
) -> Result<Json<Value>> {
    forum_service::subscribe(state.store.as_ref(), auth_user.user_id, payload.forum_id).await?;

    Ok(Json(json!({
        "message": "Subscribed",
        "forumId": payload.forum_id
    })))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<SubscriptionRequest>,
) -> Result<Json<Value>> {
    forum_service::unsubscribe(state.store.as_ref(), auth_user.user_id, payload.forum_id).await?;

    Ok(Json(json!({
        "message": "Unsubscribed",
        "forumId": payload.forum_id
    })))
}

pub async fn top_communities(State(state): State<AppState>) -> Result<Json<Vec<TopCommunity>>> {
    let communities = forum_service::get_top_communities(
        state.store.as_ref(),
        state.config.top_communities_limit,
    )
    .await?;

    Ok(Json(communities))
}
