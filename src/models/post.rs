use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Comment, Forum, PostVote, Tag, User, VoteType, tally};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// Editor block document, see [`crate::content`].
    pub content: Option<Value>,
    pub author_id: Uuid,
    pub forum_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload handed to the store once the creation gate has passed.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: Option<Value>,
    pub author_id: Uuid,
    pub forum_id: Uuid,
    pub tags: Vec<String>,
}

fn validate_content(content: &Value) -> Result<(), ValidationError> {
    crate::content::Document::validate_value(content).map_err(|message| {
        ValidationError::new("content").with_message(message.into())
    })
}

// Create post request
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(
        min = 3,
        max = 128,
        message = "Title must be between 3 and 128 characters"
    ))]
    pub title: String,
    #[validate(custom(function = "validate_content"))]
    pub content: Option<Value>,
    pub forum_id: Uuid,
    #[validate(length(max = 5, message = "A post can carry at most 5 tags"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A post together with everything a feed card renders: author, forum,
/// votes, comments and tags. Pages and `/api/posts` share this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: User,
    pub forum: Forum,
    pub votes: Vec<PostVote>,
    pub comments: Vec<Comment>,
    pub tags: Vec<Tag>,
}

impl FeedPost {
    pub fn id(&self) -> Uuid {
        self.post.id
    }

    pub fn votes_amount(&self) -> i64 {
        tally(self.votes.iter().map(|vote| vote.vote_type))
    }

    pub fn current_vote(&self, viewer: Option<Uuid>) -> Option<VoteType> {
        let viewer = viewer?;
        self.votes
            .iter()
            .find(|vote| vote.user_id == viewer)
            .map(|vote| vote.vote_type)
    }

    pub fn comment_amount(&self) -> usize {
        self.comments.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedScope {
    All,
    Following,
}

// Query string of GET /api/posts
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsQuery {
    #[validate(range(min = 1, message = "limit must be a positive integer"))]
    pub limit: u32,
    #[validate(range(min = 1, message = "page must be a positive integer"))]
    pub page: u32,
    pub forum_name: Option<String>,
    pub tag: Option<String>,
    pub feed: Option<FeedScope>,
}

/// Filter and window over the post ordering (newest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub forum_name: Option<String>,
    pub forum_ids: Option<Vec<Uuid>>,
    pub author_id: Option<Uuid>,
    pub tag: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl FeedQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit,
            ..Default::default()
        }
    }

    pub fn in_forum(mut self, forum_name: Option<&str>) -> Self {
        self.forum_name = forum_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.and_then(crate::models::normalize_tag);
        self
    }

    pub fn in_forums(mut self, forum_ids: Vec<Uuid>) -> Self {
        self.forum_ids = Some(forum_ids);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    pub fn take(&self) -> u64 {
        u64::from(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_and_take_follow_one_indexed_pages() {
        let q = FeedQuery::page(2, 10);
        assert_eq!(q.skip(), 10);
        assert_eq!(q.take(), 10);
        assert_eq!(FeedQuery::page(1, 25).skip(), 0);
        assert_eq!(FeedQuery::page(0, 25).skip(), 0);
    }

    #[test]
    fn blank_forum_name_means_no_filter() {
        let q = FeedQuery::page(1, 10).in_forum(Some("  "));
        assert_eq!(q.forum_name, None);
        let q = FeedQuery::page(1, 10).in_forum(Some("golang"));
        assert_eq!(q.forum_name.as_deref(), Some("golang"));
    }

    #[test]
    fn create_post_rejects_malformed_content() {
        let mut req = CreatePostRequest {
            title: "Hello".to_string(),
            content: Some(serde_json::json!({ "blocks": [] })),
            forum_id: Uuid::new_v4(),
            tags: None,
        };
        assert!(req.validate().is_ok());

        req.content = Some(serde_json::json!("just a string"));
        assert!(req.validate().is_err());

        req.content = None;
        req.title = "Hi".to_string();
        assert!(req.validate().is_err());
    }
}
