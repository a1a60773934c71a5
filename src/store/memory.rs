use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        Comment, CommentVote, FeedPost, FeedQuery, Forum, NewComment, NewPost, NewUser, Post,
        PostVote, ProfileUpdate, Subscription, Tag, ThreadedComment, TopCommunity, User,
        VoteSummary, VoteTarget, VoteType, tally,
    },
    store::{ForumStore, postgres::build_threads},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    forums: HashMap<Uuid, Forum>,
    subscriptions: Vec<Subscription>,
    posts: HashMap<Uuid, Post>,
    tags: HashMap<String, Tag>,
    post_tags: Vec<(Uuid, Uuid)>,
    comments: HashMap<Uuid, Comment>,
    post_votes: Vec<PostVote>,
    comment_votes: Vec<CommentVote>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall clock, bumped so that no two rows share a creation time.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn user(&self, id: Uuid) -> Result<User> {
        self.users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Dangling user reference {}", id)))
    }

    fn hydrate(&self, post: &Post) -> Result<FeedPost> {
        let forum = self
            .forums
            .get(&post.forum_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Post {} has no forum", post.id)))?;

        let mut comments: Vec<Comment> = self
            .comments
            .values()
            .filter(|comment| comment.post_id == post.id)
            .cloned()
            .collect();
        comments.sort_by_key(|comment| comment.created_at);

        let mut tags: Vec<Tag> = self
            .post_tags
            .iter()
            .filter(|(post_id, _)| *post_id == post.id)
            .filter_map(|(_, tag_id)| self.tags.values().find(|tag| tag.id == *tag_id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(FeedPost {
            author: self.user(post.author_id)?,
            forum,
            votes: self
                .post_votes
                .iter()
                .filter(|vote| vote.post_id == post.id)
                .cloned()
                .collect(),
            comments,
            tags,
            post: post.clone(),
        })
    }

    fn has_tag(&self, post_id: Uuid, name: &str) -> bool {
        let Some(tag) = self.tags.get(name) else {
            return false;
        };
        self.post_tags
            .iter()
            .any(|(p, t)| *p == post_id && *t == tag.id)
    }

    fn votes_on(&self, target: VoteTarget) -> Vec<(Uuid, VoteType)> {
        match target {
            VoteTarget::Post(id) => self
                .post_votes
                .iter()
                .filter(|vote| vote.post_id == id)
                .map(|vote| (vote.user_id, vote.vote_type))
                .collect(),
            VoteTarget::Comment(id) => self
                .comment_votes
                .iter()
                .filter(|vote| vote.comment_id == id)
                .map(|vote| (vote.user_id, vote.vote_type))
                .collect(),
        }
    }
}

/// In-process [`ForumStore`] with the same constraints as the Postgres
/// schema (unique usernames, forum names, subscriptions and votes).
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(what: &str) -> AppError {
    AppError::Internal(format!("unique constraint violated: {}", what))
}

#[async_trait]
impl ForumStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(unique_violation("users.username"));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            name: user.name,
            email: user.email,
            image: user.image,
            bio: None,
            linkedin_url: None,
            github_url: None,
            facebook_url: None,
            created_at: tables.now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.username == update.username && u.id != user_id)
        {
            return Err(unique_violation("users.username"));
        }

        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.username = update.username.clone();
        user.bio = update.bio.clone();
        user.linkedin_url = update.linkedin_url.clone();
        user.github_url = update.github_url.clone();
        user.facebook_url = update.facebook_url.clone();
        Ok(user.clone())
    }

    async fn create_forum(&self, name: &str, creator_id: Uuid) -> Result<Forum> {
        let mut tables = self.tables.write().await;
        if tables.forums.values().any(|f| f.name == name) {
            return Err(unique_violation("forums.name"));
        }

        let now = tables.now();
        let forum = Forum {
            id: Uuid::new_v4(),
            name: name.to_string(),
            creator_id: Some(creator_id),
            created_at: now,
            updated_at: now,
        };
        tables.forums.insert(forum.id, forum.clone());
        tables.subscriptions.push(Subscription {
            user_id: creator_id,
            forum_id: forum.id,
            created_at: now,
        });
        Ok(forum)
    }

    async fn get_forum_by_id(&self, id: Uuid) -> Result<Option<Forum>> {
        Ok(self.tables.read().await.forums.get(&id).cloned())
    }

    async fn get_forum_by_name(&self, name: &str) -> Result<Option<Forum>> {
        let tables = self.tables.read().await;
        Ok(tables.forums.values().find(|f| f.name == name).cloned())
    }

    async fn top_communities(&self, limit: u32) -> Result<Vec<TopCommunity>> {
        let tables = self.tables.read().await;
        let mut communities: Vec<TopCommunity> = tables
            .forums
            .values()
            .map(|forum| TopCommunity {
                forum_name: forum.name.clone(),
                member_count: tables
                    .subscriptions
                    .iter()
                    .filter(|s| s.forum_id == forum.id)
                    .count() as i64,
            })
            .collect();

        communities.sort_by(|a, b| {
            b.member_count
                .cmp(&a.member_count)
                .then_with(|| a.forum_name.cmp(&b.forum_name))
        });
        communities.truncate(limit as usize);
        Ok(communities)
    }

    async fn find_subscription(
        &self,
        user_id: Uuid,
        forum_id: Uuid,
    ) -> Result<Option<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .find(|s| s.user_id == user_id && s.forum_id == forum_id)
            .cloned())
    }

    async fn create_subscription(&self, user_id: Uuid, forum_id: Uuid) -> Result<Subscription> {
        let mut tables = self.tables.write().await;
        if tables
            .subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.forum_id == forum_id)
        {
            return Err(unique_violation("subscriptions_pkey"));
        }

        let subscription = Subscription {
            user_id,
            forum_id,
            created_at: tables.now(),
        };
        tables.subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn delete_subscription(&self, user_id: Uuid, forum_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.subscriptions.len();
        tables
            .subscriptions
            .retain(|s| !(s.user_id == user_id && s.forum_id == forum_id));
        Ok(tables.subscriptions.len() < before)
    }

    async fn count_subscribers(&self, forum_id: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.forum_id == forum_id)
            .count() as i64)
    }

    async fn subscribed_forum_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.forum_id)
            .collect())
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let now = tables.now();
        let post = Post {
            id: Uuid::new_v4(),
            title: new_post.title,
            content: new_post.content,
            author_id: new_post.author_id,
            forum_id: new_post.forum_id,
            created_at: now,
            updated_at: now,
        };

        for name in new_post.tags {
            let tag_id = tables
                .tags
                .entry(name.clone())
                .or_insert_with(|| Tag {
                    id: Uuid::new_v4(),
                    name,
                })
                .id;
            if !tables.post_tags.contains(&(post.id, tag_id)) {
                tables.post_tags.push((post.id, tag_id));
            }
        }

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn get_feed_post(&self, id: Uuid) -> Result<Option<FeedPost>> {
        let tables = self.tables.read().await;
        tables.posts.get(&id).map(|post| tables.hydrate(post)).transpose()
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedPost>> {
        let tables = self.tables.read().await;

        let forum_id_by_name = match &query.forum_name {
            Some(name) => match tables.forums.values().find(|f| &f.name == name) {
                Some(forum) => Some(forum.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|p| forum_id_by_name.is_none_or(|id| p.forum_id == id))
            .filter(|p| {
                query
                    .forum_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&p.forum_id))
            })
            .filter(|p| query.author_id.is_none_or(|id| p.author_id == id))
            .filter(|p| {
                query
                    .tag
                    .as_deref()
                    .is_none_or(|tag| tables.has_tag(p.id, tag))
            })
            .collect();

        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        posts
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.take() as usize)
            .map(|post| tables.hydrate(post))
            .collect()
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        let comment = Comment {
            id: Uuid::new_v4(),
            text: new_comment.text,
            author_id: new_comment.author_id,
            post_id: new_comment.post_id,
            reply_to_id: new_comment.reply_to_id,
            created_at: tables.now(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list_comment_threads(&self, post_id: Uuid) -> Result<Vec<ThreadedComment>> {
        let tables = self.tables.read().await;

        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);

        let mut votes: HashMap<Uuid, Vec<CommentVote>> = HashMap::new();
        for vote in &tables.comment_votes {
            votes
                .entry(vote.comment_id)
                .or_default()
                .push(vote.clone());
        }

        build_threads(comments, &tables.users, votes)
    }

    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteType>> {
        let tables = self.tables.read().await;
        Ok(tables
            .votes_on(target)
            .into_iter()
            .find(|(voter, _)| *voter == user_id)
            .map(|(_, vote)| vote))
    }

    async fn insert_vote(&self, user_id: Uuid, target: VoteTarget, vote: VoteType) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.votes_on(target).iter().any(|(voter, _)| *voter == user_id) {
            return Err(unique_violation(match target {
                VoteTarget::Post(_) => "post_votes_pkey",
                VoteTarget::Comment(_) => "comment_votes_pkey",
            }));
        }

        let created_at = tables.now();
        match target {
            VoteTarget::Post(post_id) => tables.post_votes.push(PostVote {
                user_id,
                post_id,
                vote_type: vote,
                created_at,
            }),
            VoteTarget::Comment(comment_id) => tables.comment_votes.push(CommentVote {
                user_id,
                comment_id,
                vote_type: vote,
                created_at,
            }),
        }
        Ok(())
    }

    async fn update_vote(&self, user_id: Uuid, target: VoteTarget, vote: VoteType) -> Result<()> {
        let mut tables = self.tables.write().await;
        match target {
            VoteTarget::Post(id) => tables
                .post_votes
                .iter_mut()
                .filter(|v| v.user_id == user_id && v.post_id == id)
                .for_each(|v| v.vote_type = vote),
            VoteTarget::Comment(id) => tables
                .comment_votes
                .iter_mut()
                .filter(|v| v.user_id == user_id && v.comment_id == id)
                .for_each(|v| v.vote_type = vote),
        }
        Ok(())
    }

    async fn delete_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<()> {
        let mut tables = self.tables.write().await;
        match target {
            VoteTarget::Post(id) => tables
                .post_votes
                .retain(|v| !(v.user_id == user_id && v.post_id == id)),
            VoteTarget::Comment(id) => tables
                .comment_votes
                .retain(|v| !(v.user_id == user_id && v.comment_id == id)),
        }
        Ok(())
    }

    async fn vote_summary(&self, user_id: Uuid, target: VoteTarget) -> Result<VoteSummary> {
        let tables = self.tables.read().await;
        let votes = tables.votes_on(target);
        Ok(VoteSummary {
            votes_amount: tally(votes.iter().map(|(_, vote)| *vote)),
            current_vote: votes
                .iter()
                .find(|(voter, _)| *voter == user_id)
                .map(|(_, vote)| *vote),
        })
    }
}
