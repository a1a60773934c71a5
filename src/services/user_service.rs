use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{FeedPost, FeedQuery, ProfileUpdate, User},
    store::ForumStore,
};

pub async fn update_profile(
    store: &dyn ForumStore,
    user_id: Uuid,
    update: ProfileUpdate,
) -> Result<User> {
    if let Some(owner) = store.get_user_by_username(&update.username).await? {
        if owner.id != user_id {
            return Err(AppError::Conflict("Username is taken".to_string()));
        }
    }

    let user = store.update_profile(user_id, &update).await?;
    tracing::info!(%user_id, username = %user.username, "Profile updated");
    Ok(user)
}

/// Public profile with the user's newest posts.
pub async fn get_profile(
    store: &dyn ForumStore,
    username: &str,
    page_size: u32,
) -> Result<Option<(User, Vec<FeedPost>)>> {
    let Some(user) = store.get_user_by_username(username).await? else {
        return Ok(None);
    };

    let posts = store
        .list_feed(&FeedQuery::page(1, page_size).by_author(user.id))
        .await?;

    Ok(Some((user, posts)))
}
