//! Askama templates and the view models they render.

use askama::Template;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    content::{Document, excerpt},
    error::{AppError, Result},
    models::{FeedPost, ForumDetails, ThreadedComment, TopCommunity, User, VoteType},
};

/// Relative age used on cards and comments: `just now`, `5m ago`, `3h ago`...
pub fn format_time_to_now(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);
    match seconds {
        0..60 => "just now".to_string(),
        60..3_600 => format!("{}m ago", seconds / 60),
        3_600..86_400 => format!("{}h ago", seconds / 3_600),
        86_400..2_592_000 => format!("{}d ago", seconds / 86_400),
        2_592_000..31_536_000 => format!("{}mo ago", seconds / 2_592_000),
        _ => format!("{}y ago", seconds / 31_536_000),
    }
}

pub fn member_label(count: i64) -> String {
    if count == 1 {
        format!("{} Member", count)
    } else {
        format!("{} Members", count)
    }
}

/// Home feed filtered by `name`. Tag names may hold `+`, `&` or `%`.
pub fn tag_url(name: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("/?tag={}", encoded)
}

fn vote_class(vote: Option<VoteType>) -> String {
    vote.map(|v| v.as_str().to_string()).unwrap_or_default()
}

/// Serializes the first feed page for the client to pick up, safe to drop
/// inside a `<script>` element.
pub fn initial_json(posts: &[FeedPost]) -> Result<String> {
    let json = serde_json::to_string(posts)
        .map_err(|e| AppError::Internal(format!("Feed serialization failed: {}", e)))?;
    Ok(json.replace("</", "<\\/"))
}

#[derive(Debug, Clone)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub share_url: String,
    pub forum_name: String,
    pub author_name: String,
    pub author_username: String,
    pub posted_ago: String,
    pub excerpt: String,
    pub votes_amount: i64,
    pub current_vote: String,
    pub comment_amount: usize,
    pub tags: Vec<TagLink>,
}

impl PostCard {
    pub fn new(post: &FeedPost, viewer: Option<Uuid>, app_url: &str, now: DateTime<Utc>) -> Self {
        let path = format!("/d/{}/post/{}", post.forum.name, post.id());
        let text = Document::from_value(post.post.content.as_ref()).plain_text();

        Self {
            id: post.id(),
            title: post.post.title.clone(),
            share_url: format!("{}{}", app_url.trim_end_matches('/'), path),
            url: path,
            forum_name: post.forum.name.clone(),
            author_name: post.author.display_name().to_string(),
            author_username: post.author.username.clone(),
            posted_ago: format_time_to_now(post.post.created_at, now),
            excerpt: excerpt(&text),
            votes_amount: post.votes_amount(),
            current_vote: vote_class(post.current_vote(viewer)),
            comment_amount: post.comment_amount(),
            tags: post
                .tags
                .iter()
                .map(|tag| TagLink {
                    url: tag_url(&tag.name),
                    name: tag.name.clone(),
                })
                .collect(),
        }
    }

    pub fn many(posts: &[FeedPost], viewer: Option<Uuid>, app_url: &str) -> Vec<Self> {
        let now = Utc::now();
        posts
            .iter()
            .map(|post| Self::new(post, viewer, app_url, now))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: Uuid,
    pub author_name: String,
    pub author_username: String,
    pub posted_ago: String,
    pub text: String,
    pub votes_amount: i64,
    pub current_vote: String,
    pub replies: Vec<CommentView>,
}

impl CommentView {
    pub fn new(comment: &ThreadedComment, viewer: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: comment.comment.id,
            author_name: comment.author.display_name().to_string(),
            author_username: comment.author.username.clone(),
            posted_ago: format_time_to_now(comment.comment.created_at, now),
            text: comment.comment.text.clone(),
            votes_amount: comment.votes_amount(),
            current_vote: vote_class(comment.current_vote(viewer)),
            replies: comment
                .replies
                .iter()
                .map(|reply| Self::new(reply, viewer, now))
                .collect(),
        }
    }
}

/// Feed settings handed to the infinite-scroll client.
#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub forum_name: String,
    pub tag: String,
    pub page_size: u32,
    pub initial_json: String,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub viewer_name: Option<String>,
    pub posts: Vec<PostCard>,
    pub feed: FeedMeta,
    pub top_communities: Vec<TopCommunity>,
}

#[derive(Template)]
#[template(path = "forum.html")]
pub struct ForumTemplate {
    pub viewer_name: Option<String>,
    pub forum_id: Uuid,
    pub forum_name: String,
    /// `d` or `c`, the prefix the page was reached under.
    pub prefix: String,
    pub created_on: String,
    pub created_iso: String,
    pub creator_name: Option<String>,
    pub members: String,
    pub is_subscribed: bool,
    pub is_creator: bool,
    pub posts: Vec<PostCard>,
    pub feed: FeedMeta,
}

impl ForumTemplate {
    pub fn new(
        details: &ForumDetails,
        viewer_name: Option<String>,
        viewer: Option<Uuid>,
        prefix: &str,
        tag: Option<&str>,
        app_url: &str,
        page_size: u32,
    ) -> Result<Self> {
        Ok(Self {
            viewer_name,
            forum_id: details.forum.id,
            forum_name: details.forum.name.clone(),
            prefix: prefix.to_string(),
            created_on: details.forum.created_at.format("%B %-d, %Y").to_string(),
            created_iso: details.forum.created_at.to_rfc3339(),
            creator_name: details.creator_name.clone(),
            members: member_label(details.member_count),
            is_subscribed: details.is_subscribed,
            is_creator: details.is_creator,
            posts: PostCard::many(&details.posts, viewer, app_url),
            feed: FeedMeta {
                forum_name: details.forum.name.clone(),
                tag: tag.unwrap_or_default().to_string(),
                page_size,
                initial_json: initial_json(&details.posts)?,
            },
        })
    }
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub viewer_name: Option<String>,
    pub post: PostCard,
    pub body_html: String,
    pub comments: Vec<CommentView>,
}

impl PostTemplate {
    pub fn new(
        post: &FeedPost,
        threads: &[ThreadedComment],
        viewer_name: Option<String>,
        viewer: Option<Uuid>,
        app_url: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            viewer_name,
            body_html: Document::from_value(post.post.content.as_ref()).to_html(),
            post: PostCard::new(post, viewer, app_url, now),
            comments: threads
                .iter()
                .map(|thread| CommentView::new(thread, viewer, now))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileLink {
    pub label: String,
    pub url: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub viewer_name: Option<String>,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub links: Vec<ProfileLink>,
    pub joined_on: String,
    pub is_own_profile: bool,
    pub posts: Vec<PostCard>,
}

impl ProfileTemplate {
    pub fn new(
        user: &User,
        posts: &[FeedPost],
        viewer_name: Option<String>,
        viewer: Option<Uuid>,
        app_url: &str,
    ) -> Self {
        let links = [
            ("LinkedIn", &user.linkedin_url),
            ("GitHub", &user.github_url),
            ("Facebook", &user.facebook_url),
        ]
        .into_iter()
        .filter_map(|(label, url)| {
            url.as_ref().map(|url| ProfileLink {
                label: label.to_string(),
                url: url.clone(),
            })
        })
        .collect();

        Self {
            viewer_name,
            username: user.username.clone(),
            display_name: user.display_name().to_string(),
            bio: user.bio.clone(),
            links,
            joined_on: user.created_at.format("%B %-d, %Y").to_string(),
            is_own_profile: viewer == Some(user.id),
            posts: PostCard::many(posts, viewer, app_url),
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub viewer_name: Option<String>,
    pub message: String,
}
