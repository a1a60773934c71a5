use axum::{extract::State, http::StatusCode, response::Json};

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    models::{Comment, CommentVoteRequest, CreateCommentRequest, VoteSummary, VoteTarget},
    services::{comment_service, vote_service},
    validation::ValidatedJson,
};

pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment =
        comment_service::create_comment(state.store.as_ref(), auth_user.user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn vote_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CommentVoteRequest>,
) -> Result<Json<VoteSummary>> {
    let summary = vote_service::cast_vote(
        state.store.as_ref(),
        auth_user.user_id,
        VoteTarget::Comment(payload.comment_id),
        payload.vote_type,
    )
    .await?;

    Ok(Json(summary))
}
