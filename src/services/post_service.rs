use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        CreatePostRequest, FeedPost, FeedQuery, FeedScope, NewPost, Post, PostsQuery,
        ThreadedComment, normalize_tags,
    },
    services::comment_service,
    store::ForumStore,
};

/// Builds the store query behind `GET /api/posts`. `limit` is capped at
/// `max_page_size`; the following scope needs a signed-in viewer.
pub async fn feed_query(
    store: &dyn ForumStore,
    params: &PostsQuery,
    viewer: Option<Uuid>,
    max_page_size: u32,
) -> Result<FeedQuery> {
    let mut query = FeedQuery::page(params.page, params.limit.min(max_page_size))
        .in_forum(params.forum_name.as_deref())
        .with_tag(params.tag.as_deref());

    if query.forum_name.is_none() && params.feed == Some(FeedScope::Following) {
        let viewer = viewer.ok_or_else(|| {
            AppError::Authentication("Sign in to see the communities you follow".to_string())
        })?;
        let forum_ids = store.subscribed_forum_ids(viewer).await?;
        if !forum_ids.is_empty() {
            query = query.in_forums(forum_ids);
        }
    }

    Ok(query)
}

/// One page of the feed, newest first. Pages rendered on the server and
/// pages fetched by the client both come from here.
pub async fn get_posts(store: &dyn ForumStore, query: &FeedQuery) -> Result<Vec<FeedPost>> {
    let posts = store.list_feed(query).await?;

    tracing::debug!(
        forum = ?query.forum_name,
        tag = ?query.tag,
        page = query.page,
        limit = query.limit,
        returned = posts.len(),
        "Loaded feed page"
    );

    Ok(posts)
}

/// Post creation gate: forum must exist and the author must follow it.
pub async fn create_post(
    store: &dyn ForumStore,
    author_id: Uuid,
    request: CreatePostRequest,
) -> Result<Post> {
    let forum = store
        .get_forum_by_id(request.forum_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Forum not found".to_string()))?;

    if store
        .find_subscription(author_id, forum.id)
        .await?
        .is_none()
    {
        return Err(AppError::Authorization(
            "You are not subscribed to this forum".to_string(),
        ));
    }

    let post = store
        .create_post(NewPost {
            title: request.title.trim().to_string(),
            content: request.content.filter(|content| !content.is_null()),
            author_id,
            forum_id: forum.id,
            tags: normalize_tags(&request.tags.unwrap_or_default()),
        })
        .await?;

    tracing::info!(post_id = %post.id, forum = %forum.name, "Post created");
    Ok(post)
}

/// A post and its comment threads, as the post page renders them.
/// `None` when the post does not exist or belongs to another forum.
pub async fn get_post_page(
    store: &dyn ForumStore,
    forum_name: &str,
    post_id: Uuid,
) -> Result<Option<(FeedPost, Vec<ThreadedComment>)>> {
    let (post, threads) = tokio::try_join!(
        store.get_feed_post(post_id),
        comment_service::get_comment_threads(store, post_id),
    )?;

    Ok(post
        .filter(|post| post.forum.name == forum_name)
        .map(|post| (post, threads)))
}
