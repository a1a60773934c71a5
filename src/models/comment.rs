use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{CommentVote, User, tally};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub reply_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub reply_to_id: Option<Uuid>,
}

fn validate_comment_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::new("text").with_message("Comment must not be empty".into()))
    } else {
        Ok(())
    }
}

// Create comment request
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[validate(
        custom(function = "validate_comment_text"),
        length(max = 10000, message = "Comment must be at most 10000 characters")
    )]
    pub text: String,
    #[serde(default)]
    pub reply_to_id: Option<Uuid>,
}

/// A comment with its author and votes; top-level comments carry their
/// replies, replies carry none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: User,
    pub votes: Vec<CommentVote>,
    pub replies: Vec<ThreadedComment>,
}

impl ThreadedComment {
    pub fn votes_amount(&self) -> i64 {
        tally(self.votes.iter().map(|vote| vote.vote_type))
    }

    pub fn current_vote(&self, viewer: Option<Uuid>) -> Option<crate::models::VoteType> {
        let viewer = viewer?;
        self.votes
            .iter()
            .find(|vote| vote.user_id == viewer)
            .map(|vote| vote.vote_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: String) -> CreateCommentRequest {
        CreateCommentRequest {
            post_id: Uuid::new_v4(),
            text,
            reply_to_id: None,
        }
    }

    fn message(request: CreateCommentRequest) -> String {
        match crate::error::AppError::from(request.validate().unwrap_err()) {
            crate::error::AppError::Validation(message) => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_and_oversized_comments_get_distinct_messages() {
        assert!(request("Nice post".to_string()).validate().is_ok());
        assert_eq!(message(request("   ".to_string())), "text: Comment must not be empty");
        assert_eq!(
            message(request("x".repeat(10001))),
            "text: Comment must be at most 10000 characters"
        );
    }
}
