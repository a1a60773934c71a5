use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        Comment, CommentVote, FeedPost, FeedQuery, Forum, NewComment, NewPost, NewUser, Post,
        PostVote, ProfileUpdate, Subscription, Tag, ThreadedComment, TopCommunity, User,
        VoteSummary, VoteTarget, VoteType, tally,
    },
    store::ForumStore,
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    async fn users_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.db)
            .await?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }

    /// Loads authors, forums, votes, comments and tags for a page of posts
    /// with one query per relation.
    async fn hydrate_posts(&self, posts: Vec<Post>) -> Result<Vec<FeedPost>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        let forum_ids: Vec<Uuid> = posts.iter().map(|p| p.forum_id).collect();

        let authors = self.users_by_id(&author_ids).await?;

        let forums: HashMap<Uuid, Forum> =
            sqlx::query_as::<_, Forum>("SELECT * FROM forums WHERE id = ANY($1)")
                .bind(&forum_ids)
                .fetch_all(&self.db)
                .await?
                .into_iter()
                .map(|forum| (forum.id, forum))
                .collect();

        let mut votes: HashMap<Uuid, Vec<PostVote>> = HashMap::new();
        for vote in sqlx::query_as::<_, PostVote>(
            "SELECT * FROM post_votes WHERE post_id = ANY($1) ORDER BY created_at",
        )
        .bind(&post_ids)
        .fetch_all(&self.db)
        .await?
        {
            votes.entry(vote.post_id).or_default().push(vote);
        }

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for comment in sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = ANY($1) ORDER BY created_at, id",
        )
        .bind(&post_ids)
        .fetch_all(&self.db)
        .await?
        {
            comments.entry(comment.post_id).or_default().push(comment);
        }

        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in sqlx::query(
            r#"
            SELECT pt.post_id, t.id, t.name
            FROM post_tags pt
            JOIN tags t ON pt.tag_id = t.id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.db)
        .await?
        {
            let post_id: Uuid = row.get("post_id");
            tags.entry(post_id).or_default().push(Tag::from_row(&row)?);
        }

        posts
            .into_iter()
            .map(|post| {
                let author = authors
                    .get(&post.author_id)
                    .cloned()
                    .ok_or_else(|| AppError::Internal(format!("Post {} has no author", post.id)))?;
                let forum = forums
                    .get(&post.forum_id)
                    .cloned()
                    .ok_or_else(|| AppError::Internal(format!("Post {} has no forum", post.id)))?;

                Ok(FeedPost {
                    votes: votes.remove(&post.id).unwrap_or_default(),
                    comments: comments.remove(&post.id).unwrap_or_default(),
                    tags: tags.remove(&post.id).unwrap_or_default(),
                    author,
                    forum,
                    post,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ForumStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, name, email, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $1,
                bio = $2,
                linkedin_url = $3,
                github_url = $4,
                facebook_url = $5,
                updated_at = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&update.username)
        .bind(&update.bio)
        .bind(&update.linkedin_url)
        .bind(&update.github_url)
        .bind(&update.facebook_url)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    async fn create_forum(&self, name: &str, creator_id: Uuid) -> Result<Forum> {
        let mut tx = self.db.begin().await?;
        let now = Utc::now();

        let forum = sqlx::query_as::<_, Forum>(
            r#"
            INSERT INTO forums (id, name, creator_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(creator_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO subscriptions (user_id, forum_id, created_at) VALUES ($1, $2, $3)")
            .bind(creator_id)
            .bind(forum.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(forum)
    }

    async fn get_forum_by_id(&self, id: Uuid) -> Result<Option<Forum>> {
        let forum = sqlx::query_as::<_, Forum>("SELECT * FROM forums WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(forum)
    }

    async fn get_forum_by_name(&self, name: &str) -> Result<Option<Forum>> {
        let forum = sqlx::query_as::<_, Forum>("SELECT * FROM forums WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        Ok(forum)
    }

    async fn top_communities(&self, limit: u32) -> Result<Vec<TopCommunity>> {
        let communities = sqlx::query_as::<_, TopCommunity>(
            r#"
            SELECT f.name AS forum_name, COUNT(s.user_id) AS member_count
            FROM forums f
            LEFT JOIN subscriptions s ON s.forum_id = f.id
            GROUP BY f.id, f.name
            ORDER BY member_count DESC, f.name ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(communities)
    }

    async fn find_subscription(
        &self,
        user_id: Uuid,
        forum_id: Uuid,
    ) -> Result<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE user_id = $1 AND forum_id = $2",
        )
        .bind(user_id)
        .bind(forum_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(subscription)
    }

    async fn create_subscription(&self, user_id: Uuid, forum_id: Uuid) -> Result<Subscription> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, forum_id, created_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(forum_id)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(subscription)
    }

    async fn delete_subscription(&self, user_id: Uuid, forum_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND forum_id = $2")
            .bind(user_id)
            .bind(forum_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_subscribers(&self, forum_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM subscriptions WHERE forum_id = $1")
            .bind(forum_id)
            .fetch_one(&self.db)
            .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn subscribed_forum_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT forum_id FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.iter().map(|row| row.get("forum_id")).collect())
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let mut tx = self.db.begin().await?;
        let now = Utc::now();

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, title, content, author_id, forum_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(new_post.author_id)
        .bind(new_post.forum_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for name in &new_post.tags {
            let tag_id: Uuid = sqlx::query(
                r#"
                INSERT INTO tags (id, name) VALUES ($1, $2)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .fetch_one(&mut *tx)
            .await?
            .get("id");

            sqlx::query(
                "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(post)
    }

    async fn get_feed_post(&self, id: Uuid) -> Result<Option<FeedPost>> {
        let Some(post) = self.get_post(id).await? else {
            return Ok(None);
        };

        Ok(self.hydrate_posts(vec![post]).await?.pop())
    }

    async fn list_feed(&self, query: &FeedQuery) -> Result<Vec<FeedPost>> {
        let mut sql = r#"
            SELECT p.*
            FROM posts p
            JOIN forums f ON p.forum_id = f.id
            WHERE TRUE
        "#
        .to_string();

        let mut param_count = 0;

        if query.forum_name.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND f.name = ${}", param_count));
        }

        if query.forum_ids.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND p.forum_id = ANY(${})", param_count));
        }

        if query.author_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND p.author_id = ${}", param_count));
        }

        if query.tag.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                r#" AND EXISTS (
                    SELECT 1 FROM post_tags pt
                    JOIN tags t ON pt.tag_id = t.id
                    WHERE pt.post_id = p.id AND t.name = ${}
                )"#,
                param_count
            ));
        }

        sql.push_str(&format!(
            " ORDER BY p.created_at DESC, p.id DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        ));

        let mut query_builder = sqlx::query_as::<_, Post>(&sql);

        if let Some(forum_name) = &query.forum_name {
            query_builder = query_builder.bind(forum_name);
        }
        if let Some(forum_ids) = &query.forum_ids {
            query_builder = query_builder.bind(forum_ids);
        }
        if let Some(author_id) = query.author_id {
            query_builder = query_builder.bind(author_id);
        }
        if let Some(tag) = &query.tag {
            query_builder = query_builder.bind(tag);
        }

        let posts = query_builder
            .bind(query.take() as i64)
            .bind(query.skip() as i64)
            .fetch_all(&self.db)
            .await?;

        self.hydrate_posts(posts).await
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, text, author_id, post_id, reply_to_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&comment.text)
        .bind(comment.author_id)
        .bind(comment.post_id)
        .bind(comment.reply_to_id)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(comment)
    }

    async fn list_comment_threads(&self, post_id: Uuid) -> Result<Vec<ThreadedComment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = $1 ORDER BY created_at, id",
        )
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;

        if comments.is_empty() {
            return Ok(Vec::new());
        }

        let comment_ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
        let author_ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
        let authors = self.users_by_id(&author_ids).await?;

        let mut votes: HashMap<Uuid, Vec<CommentVote>> = HashMap::new();
        for vote in sqlx::query_as::<_, CommentVote>(
            "SELECT * FROM comment_votes WHERE comment_id = ANY($1) ORDER BY created_at",
        )
        .bind(&comment_ids)
        .fetch_all(&self.db)
        .await?
        {
            votes.entry(vote.comment_id).or_default().push(vote);
        }

        build_threads(comments, &authors, votes)
    }

    async fn find_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<Option<VoteType>> {
        let sql = match target {
            VoteTarget::Post(_) => {
                "SELECT vote_type FROM post_votes WHERE user_id = $1 AND post_id = $2"
            }
            VoteTarget::Comment(_) => {
                "SELECT vote_type FROM comment_votes WHERE user_id = $1 AND comment_id = $2"
            }
        };

        let row = sqlx::query(sql)
            .bind(user_id)
            .bind(target.id())
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|row| row.get::<VoteType, _>("vote_type")))
    }

    async fn insert_vote(&self, user_id: Uuid, target: VoteTarget, vote: VoteType) -> Result<()> {
        let sql = match target {
            VoteTarget::Post(_) => {
                "INSERT INTO post_votes (user_id, post_id, vote_type, created_at) VALUES ($1, $2, $3, $4)"
            }
            VoteTarget::Comment(_) => {
                "INSERT INTO comment_votes (user_id, comment_id, vote_type, created_at) VALUES ($1, $2, $3, $4)"
            }
        };

        sqlx::query(sql)
            .bind(user_id)
            .bind(target.id())
            .bind(vote)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn update_vote(&self, user_id: Uuid, target: VoteTarget, vote: VoteType) -> Result<()> {
        let sql = match target {
            VoteTarget::Post(_) => {
                "UPDATE post_votes SET vote_type = $3 WHERE user_id = $1 AND post_id = $2"
            }
            VoteTarget::Comment(_) => {
                "UPDATE comment_votes SET vote_type = $3 WHERE user_id = $1 AND comment_id = $2"
            }
        };

        sqlx::query(sql)
            .bind(user_id)
            .bind(target.id())
            .bind(vote)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn delete_vote(&self, user_id: Uuid, target: VoteTarget) -> Result<()> {
        let sql = match target {
            VoteTarget::Post(_) => "DELETE FROM post_votes WHERE user_id = $1 AND post_id = $2",
            VoteTarget::Comment(_) => {
                "DELETE FROM comment_votes WHERE user_id = $1 AND comment_id = $2"
            }
        };

        sqlx::query(sql)
            .bind(user_id)
            .bind(target.id())
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn vote_summary(&self, user_id: Uuid, target: VoteTarget) -> Result<VoteSummary> {
        let sql = match target {
            VoteTarget::Post(_) => "SELECT user_id, vote_type FROM post_votes WHERE post_id = $1",
            VoteTarget::Comment(_) => {
                "SELECT user_id, vote_type FROM comment_votes WHERE comment_id = $1"
            }
        };

        let rows = sqlx::query(sql)
            .bind(target.id())
            .fetch_all(&self.db)
            .await?;

        let votes: Vec<(Uuid, VoteType)> = rows
            .iter()
            .map(|row| (row.get("user_id"), row.get("vote_type")))
            .collect();

        Ok(VoteSummary {
            votes_amount: tally(votes.iter().map(|(_, vote)| *vote)),
            current_vote: votes
                .iter()
                .find(|(voter, _)| *voter == user_id)
                .map(|(_, vote)| *vote),
        })
    }
}

/// Groups a post's comments (oldest first) into top-level threads.
/// Replies whose parent is missing or is itself a reply are dropped.
pub(crate) fn build_threads(
    comments: Vec<Comment>,
    authors: &HashMap<Uuid, User>,
    mut votes: HashMap<Uuid, Vec<CommentVote>>,
) -> Result<Vec<ThreadedComment>> {
    let mut threads: Vec<ThreadedComment> = Vec::new();
    let mut replies: Vec<Comment> = Vec::new();

    for comment in comments {
        if comment.reply_to_id.is_some() {
            replies.push(comment);
            continue;
        }
        let author = authors
            .get(&comment.author_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Comment {} has no author", comment.id)))?;
        threads.push(ThreadedComment {
            votes: votes.remove(&comment.id).unwrap_or_default(),
            author,
            comment,
            replies: Vec::new(),
        });
    }

    for reply in replies {
        let Some(parent) = threads
            .iter_mut()
            .find(|thread| Some(thread.comment.id) == reply.reply_to_id)
        else {
            continue;
        };
        let author = authors
            .get(&reply.author_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("Comment {} has no author", reply.id)))?;
        parent.replies.push(ThreadedComment {
            votes: votes.remove(&reply.id).unwrap_or_default(),
            author,
            comment: reply,
            replies: Vec::new(),
        });
    }

    Ok(threads)
}
