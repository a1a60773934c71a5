//! Typed HTTP client for the JSON API, plus the interactive pieces built on
//! it: the optimistic vote widget, the infinite-scroll feed and the form
//! submission flows.

pub mod feed;
pub mod forms;
pub mod vote;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Comment, CommentVoteRequest, CreateCommentRequest, CreateForumRequest, CreatePostRequest,
    FeedPost, FeedScope, Forum, Post, PostVoteRequest, SubscriptionRequest, TopCommunity,
    UpdateProfileRequest, User, VoteSummary, VoteType,
};

pub use feed::PostFeed;
pub use forms::{SubmitOutcome, submit_post, submit_profile};
pub use vote::{PendingVote, VoteFeedback, VoteState, VoteTransition, VoteWidget};

/// Where the client sends a visitor whose session is missing or expired.
pub const SIGN_IN_REDIRECT: &str = "/signin?unauthorized=1";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::CONFLICT => ClientError::Conflict(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// A user-visible toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: Option<String>,
    pub description: String,
    pub destructive: bool,
}

impl Notice {
    pub fn error(title: &str, description: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            description: description.to_string(),
            destructive: true,
        }
    }

    pub fn success(title: Option<&str>, description: &str) -> Self {
        Self {
            title: title.map(str::to_string),
            description: description.to_string(),
            destructive: false,
        }
    }
}

/// Query parameters of `GET /api/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub limit: u32,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forum_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedScope>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct ForumClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ForumClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);

        tracing::debug!(status = status.as_u16(), %message, "API request failed");
        Err(ClientError::from_status(status, message))
    }

    pub async fn get_posts(&self, params: &FeedParams) -> ClientResult<Vec<FeedPost>> {
        self.send(self.request(Method::GET, "/api/posts").query(params))
            .await
    }

    pub async fn create_forum(&self, name: &str) -> ClientResult<Forum> {
        let body = CreateForumRequest {
            name: name.to_string(),
        };
        self.send(self.request(Method::POST, "/api/forum").json(&body))
            .await
    }

    pub async fn subscribe(&self, forum_id: Uuid) -> ClientResult<serde_json::Value> {
        self.send(
            self.request(Method::POST, "/api/forum/subscribe")
                .json(&SubscriptionRequest { forum_id }),
        )
        .await
    }

    pub async fn unsubscribe(&self, forum_id: Uuid) -> ClientResult<serde_json::Value> {
        self.send(
            self.request(Method::POST, "/api/forum/unsubscribe")
                .json(&SubscriptionRequest { forum_id }),
        )
        .await
    }

    pub async fn create_post(&self, request: &CreatePostRequest) -> ClientResult<Post> {
        self.send(
            self.request(Method::POST, "/api/forum/post/create")
                .json(request),
        )
        .await
    }

    pub async fn vote_post(&self, post_id: Uuid, vote_type: VoteType) -> ClientResult<VoteSummary> {
        self.send(
            self.request(Method::PATCH, "/api/forum/post/vote")
                .json(&PostVoteRequest { post_id, vote_type }),
        )
        .await
    }

    pub async fn vote_comment(
        &self,
        comment_id: Uuid,
        vote_type: VoteType,
    ) -> ClientResult<VoteSummary> {
        self.send(
            self.request(Method::PATCH, "/api/forum/comment/vote")
                .json(&CommentVoteRequest {
                    comment_id,
                    vote_type,
                }),
        )
        .await
    }

    pub async fn create_comment(&self, request: &CreateCommentRequest) -> ClientResult<Comment> {
        self.send(
            self.request(Method::POST, "/api/forum/post/comment")
                .json(request),
        )
        .await
    }

    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> ClientResult<User> {
        self.send(self.request(Method::PATCH, "/api/user").json(request))
            .await
    }

    pub async fn top_communities(&self) -> ClientResult<Vec<TopCommunity>> {
        self.send(self.request(Method::GET, "/api/forums/top")).await
    }
}
