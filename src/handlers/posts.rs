use axum::{extract::State, http::StatusCode, response::Json};

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{CreatePostRequest, FeedPost, Post, PostVoteRequest, PostsQuery, VoteSummary, VoteTarget},
    services::{post_service, vote_service},
    validation::{ValidatedJson, ValidatedQuery},
};

pub async fn get_posts(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    ValidatedQuery(params): ValidatedQuery<PostsQuery>,
) -> Result<Json<Vec<FeedPost>>> {
    let store = state.store.as_ref();
    let query =
        post_service::feed_query(store, &params, viewer.user_id(), state.config.max_page_size)
            .await?;

    let posts = post_service::get_posts(store, &query).await?;
    if posts.is_empty() {
        return Err(AppError::NotFound(
            "No posts found with the given forum name".to_string(),
        ));
    }

    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    let post = post_service::create_post(state.store.as_ref(), auth_user.user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn vote_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<PostVoteRequest>,
) -> Result<Json<VoteSummary>> {
    let summary = vote_service::cast_vote(
        state.store.as_ref(),
        auth_user.user_id,
        VoteTarget::Post(payload.post_id),
        payload.vote_type,
    )
    .await?;

    Ok(Json(summary))
}
