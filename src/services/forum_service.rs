use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{FeedQuery, Forum, ForumDetails, Subscription, TopCommunity},
    services::post_service,
    store::ForumStore,
};

pub async fn create_forum(store: &dyn ForumStore, creator_id: Uuid, name: &str) -> Result<Forum> {
    if store.get_forum_by_name(name).await?.is_some() {
        return Err(AppError::Conflict("Forum already exists".to_string()));
    }

    let forum = store.create_forum(name, creator_id).await?;
    tracing::info!(forum_id = %forum.id, name = %forum.name, "Forum created");
    Ok(forum)
}

/// Forum with its first feed page and the viewer's relationship to it.
/// `tag` narrows the feed; `page_size` is the server-rendered page length.
pub async fn get_forum(
    store: &dyn ForumStore,
    name: &str,
    viewer: Option<Uuid>,
    tag: Option<&str>,
    page_size: u32,
) -> Result<Option<ForumDetails>> {
    let Some(forum) = store.get_forum_by_name(name).await? else {
        return Ok(None);
    };

    let query = FeedQuery::page(1, page_size)
        .in_forum(Some(&forum.name))
        .with_tag(tag);

    let subscription = async {
        match viewer {
            Some(user_id) => store.find_subscription(user_id, forum.id).await,
            None => Ok(None),
        }
    };

    let creator = async {
        match forum.creator_id {
            Some(creator_id) => store.get_user(creator_id).await,
            None => Ok(None),
        }
    };

    let (posts, member_count, subscription, creator) = tokio::try_join!(
        post_service::get_posts(store, &query),
        store.count_subscribers(forum.id),
        subscription,
        creator,
    )?;

    let is_creator = viewer.is_some() && forum.creator_id == viewer;

    Ok(Some(ForumDetails {
        is_subscribed: subscription.is_some(),
        is_creator,
        member_count,
        creator_name: creator.map(|user| user.username),
        posts,
        forum,
    }))
}

pub async fn get_top_communities(store: &dyn ForumStore, limit: u32) -> Result<Vec<TopCommunity>> {
    store.top_communities(limit).await
}

async fn existing_forum(store: &dyn ForumStore, forum_id: Uuid) -> Result<Forum> {
    store
        .get_forum_by_id(forum_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Forum not found".to_string()))
}

pub async fn subscribe(
    store: &dyn ForumStore,
    user_id: Uuid,
    forum_id: Uuid,
) -> Result<Subscription> {
    let forum = existing_forum(store, forum_id).await?;

    if store.find_subscription(user_id, forum.id).await?.is_some() {
        return Err(AppError::Conflict(
            "You are already subscribed to this forum".to_string(),
        ));
    }

    let subscription = store.create_subscription(user_id, forum.id).await?;
    tracing::debug!(%user_id, forum = %forum.name, "Subscribed");
    Ok(subscription)
}

pub async fn unsubscribe(store: &dyn ForumStore, user_id: Uuid, forum_id: Uuid) -> Result<()> {
    let forum = existing_forum(store, forum_id).await?;

    if forum.creator_id == Some(user_id) {
        return Err(AppError::BadRequest(
            "You cannot unsubscribe from your own forum".to_string(),
        ));
    }

    if !store.delete_subscription(user_id, forum.id).await? {
        return Err(AppError::Conflict(
            "You are not subscribed to this forum".to_string(),
        ));
    }

    tracing::debug!(%user_id, forum = %forum.name, "Unsubscribed");
    Ok(())
}
