use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{VoteSummary, VoteTarget, VoteType},
    store::ForumStore,
};

/// Store write implied by a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Insert(VoteType),
    Flip(VoteType),
    Withdraw,
}

/// Repeating the stored vote withdraws it; voting the other way flips it.
pub fn resolve(existing: Option<VoteType>, requested: VoteType) -> VoteChange {
    match existing {
        Some(current) if current == requested => VoteChange::Withdraw,
        Some(_) => VoteChange::Flip(requested),
        None => VoteChange::Insert(requested),
    }
}

async fn ensure_target_exists(store: &dyn ForumStore, target: VoteTarget) -> Result<()> {
    let exists = match target {
        VoteTarget::Post(id) => store.get_post(id).await?.is_some(),
        VoteTarget::Comment(id) => store.get_comment(id).await?.is_some(),
    };

    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound(match target {
            VoteTarget::Post(_) => "Post not found".to_string(),
            VoteTarget::Comment(_) => "Comment not found".to_string(),
        }))
    }
}

pub async fn cast_vote(
    store: &dyn ForumStore,
    user_id: Uuid,
    target: VoteTarget,
    vote_type: VoteType,
) -> Result<VoteSummary> {
    ensure_target_exists(store, target).await?;

    let existing = store.find_vote(user_id, target).await?;
    let change = resolve(existing, vote_type);

    match change {
        VoteChange::Insert(vote) => store.insert_vote(user_id, target, vote).await?,
        VoteChange::Flip(vote) => store.update_vote(user_id, target, vote).await?,
        VoteChange::Withdraw => store.delete_vote(user_id, target).await?,
    }

    tracing::debug!(
        target_kind = target.kind(),
        target_id = %target.id(),
        ?change,
        "Vote recorded"
    );

    store.vote_summary(user_id, target).await
}
