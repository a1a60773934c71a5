//! Persistence port. Handlers and services only see [`ForumStore`];
//! [`PgStore`] backs the running server and [`MemoryStore`] backs tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        Comment, FeedPost, FeedQuery, Forum, NewComment, NewPost, NewUser, Post, ProfileUpdate,
        Subscription, ThreadedComment, TopCommunity, User, VoteSummary, VoteTarget, VoteType,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ForumStore: Send + Sync {
    // Users
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<User>;

    // Forums
    /// Creates the forum and subscribes its creator in one write.
    async fn create_forum(&self, name: &str, creator_id: Uuid) -> Result<Forum>;
    async fn get_forum_by_id(&self, id: Uuid) -> Result<Option<Forum>>;
    async fn get_forum_by_name(&self, name: &str) -> Result<Option<Forum>>;
    async fn top_communities(&self, limit: u32) -> Result<Vec<TopCommunity>>;

    // Subscriptions
    async fn find_subscription(&self, user_id: Uuid, forum_id: Uuid)
    -> Result<Option<Subscription>>;
    async fn create_subscription(&self, user_id: Uuid, forum_id: Uuid) -> Result<Subscription>;
    async fn delete_subscription(&self, user_id: Uuid, forum_id: Uuid) -> Result<bool>;
    async fn count_subscribers(&self, forum_id: Uuid) -> Result<i64>;
    async fn subscribed_forum_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    // Posts
    async fn create_post(&self, post: NewPost) -> Result<Post>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;
    async fn get_feed_post(&self, id: Uuid) -> Result<Option<FeedPost>>;
    /// Newest first, windowed by `query.skip()` / `query.take()`, each post
    /// loaded with author, forum, votes, comments and tags.
    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedPost>>;

    // Comments
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>>;
    /// Top-level comments (oldest first) with their replies.
    async fn list_comment_threads(&self, post_id: Uuid) -> Result<Vec<ThreadedComment>>;

    // Votes
    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteType>>;
    async fn insert_vote(&self, user_id: Uuid, target: VoteTarget, vote: VoteType) -> Result<()>;
    async fn update_vote(&self, user_id: Uuid, target: VoteTarget, vote: VoteType) -> Result<()>;
    async fn delete_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<()>;
    async fn vote_summary(&self, user_id: Uuid, target: VoteTarget) -> Result<VoteSummary>;
}
