use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    /// Contribution of a single vote to a target's score.
    pub fn weight(self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteType::Up => "UP",
            VoteType::Down => "DOWN",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostVote {
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentVote {
    pub user_id: Uuid,
    pub comment_id: Uuid,
    #[serde(rename = "type")]
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

/// The entity a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl VoteTarget {
    pub fn id(self) -> Uuid {
        match self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) => id,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "post",
            VoteTarget::Comment(_) => "comment",
        }
    }
}

// Vote requests
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVoteRequest {
    pub post_id: Uuid,
    pub vote_type: VoteType,
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVoteRequest {
    pub comment_id: Uuid,
    pub vote_type: VoteType,
}

// Vote response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub votes_amount: i64,
    pub current_vote: Option<VoteType>,
}

/// Net score of a set of votes: UP counts +1, DOWN counts -1.
pub fn tally<I>(votes: I) -> i64
where
    I: IntoIterator<Item = VoteType>,
{
    votes.into_iter().map(VoteType::weight).sum()
}
