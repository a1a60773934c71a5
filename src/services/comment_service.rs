use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Comment, CreateCommentRequest, NewComment, ThreadedComment},
    store::ForumStore,
};

/// Threads are two levels deep: a reply must target a top-level comment
/// on the same post.
pub async fn create_comment(
    store: &dyn ForumStore,
    author_id: Uuid,
    request: CreateCommentRequest,
) -> Result<Comment> {
    let post = store
        .get_post(request.post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if let Some(reply_to_id) = request.reply_to_id {
        let parent = store
            .get_comment(reply_to_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if parent.post_id != post.id {
            return Err(AppError::BadRequest(
                "Reply must belong to the same post".to_string(),
            ));
        }
        if parent.reply_to_id.is_some() {
            return Err(AppError::BadRequest(
                "Cannot reply to a reply".to_string(),
            ));
        }
    }

    let text = request.text.trim().to_string();

    let comment = store
        .create_comment(NewComment {
            text,
            author_id,
            post_id: post.id,
            reply_to_id: request.reply_to_id,
        })
        .await?;

    tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment created");
    Ok(comment)
}

pub async fn get_comment_threads(
    store: &dyn ForumStore,
    post_id: Uuid,
) -> Result<Vec<ThreadedComment>> {
    store.list_comment_threads(post_id).await
}
