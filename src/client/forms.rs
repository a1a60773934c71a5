//! Submission flows of the post editor and the profile form. Payloads are
//! checked locally with the same rules the server applies before any
//! request goes out; every server failure ends as a [`SubmitOutcome`].

use validator::Validate;

use crate::{
    client::{ClientError, ForumClient, Notice, SIGN_IN_REDIRECT},
    models::{CreatePostRequest, Post, UpdateProfileRequest, User},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<T> {
    Done {
        value: T,
        notice: Notice,
        redirect: Option<String>,
    },
    /// Local validation failed; one notice per message, nothing was sent.
    Invalid(Vec<Notice>),
    SignInRequired { redirect: String },
    Failed(Notice),
}

impl<T> SubmitOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, SubmitOutcome::Done { .. })
    }
}

fn local_errors<R: Validate>(request: &R) -> Option<Vec<Notice>> {
    let errors = request.validate().err()?;
    let mut notices: Vec<Notice> = errors
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .map(|error| {
            let message = error
                .message
                .as_deref()
                .unwrap_or("Invalid value")
                .to_string();
            Notice::error("Something went wrong", &message)
        })
        .collect();

    if notices.is_empty() {
        // Only nested struct errors (profile urls).
        notices.push(Notice::error("Something went wrong", "Please enter a valid URL"));
    }
    Some(notices)
}

pub async fn submit_post(
    client: &ForumClient,
    forum_name: &str,
    request: &CreatePostRequest,
) -> SubmitOutcome<Post> {
    if let Some(notices) = local_errors(request) {
        return SubmitOutcome::Invalid(notices);
    }

    match client.create_post(request).await {
        Ok(post) => SubmitOutcome::Done {
            value: post,
            notice: Notice::success(None, "Your post is published"),
            redirect: Some(format!("/d/{}", forum_name)),
        },
        Err(ClientError::Unauthorized(_)) => SubmitOutcome::SignInRequired {
            redirect: SIGN_IN_REDIRECT.to_string(),
        },
        Err(ClientError::Forbidden(_)) => SubmitOutcome::Failed(Notice::error(
            "You are not subscribed to this community",
            "Please join the community and try again.",
        )),
        Err(error) => {
            tracing::warn!(%error, "Post submission failed");
            SubmitOutcome::Failed(Notice::error(
                "Something went wrong",
                "Your post is not published, please try again later",
            ))
        }
    }
}

pub async fn submit_profile(
    client: &ForumClient,
    request: &UpdateProfileRequest,
) -> SubmitOutcome<User> {
    if let Some(notices) = local_errors(request) {
        return SubmitOutcome::Invalid(notices);
    }

    match client.update_profile(request).await {
        Ok(user) => SubmitOutcome::Done {
            value: user,
            notice: Notice::success(
                Some("Profile Updated"),
                "Your profile has been updated successfully.",
            ),
            redirect: None,
        },
        Err(ClientError::Unauthorized(_)) => SubmitOutcome::SignInRequired {
            redirect: SIGN_IN_REDIRECT.to_string(),
        },
        Err(ClientError::Conflict(message)) => {
            SubmitOutcome::Failed(Notice::error("Username is taken", &message))
        }
        Err(error) => {
            tracing::warn!(%error, "Profile update failed");
            SubmitOutcome::Failed(Notice::error(
                "Something went wrong",
                "It's on us, please try again later",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // Nothing listens here; a request would fail with a transport error.
    fn offline_client() -> ForumClient {
        ForumClient::new("http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn invalid_post_is_not_sent() {
        let request = CreatePostRequest {
            title: "no".to_string(),
            content: None,
            forum_id: Uuid::new_v4(),
            tags: None,
        };

        let outcome = submit_post(&offline_client(), "golang", &request).await;
        match outcome {
            SubmitOutcome::Invalid(notices) => {
                assert_eq!(notices.len(), 1);
                assert_eq!(
                    notices[0].description,
                    "Title must be between 3 and 128 characters"
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_becomes_a_notice() {
        let request = UpdateProfileRequest {
            username: "ferris".to_string(),
            bio: None,
            urls: None,
        };

        match submit_profile(&offline_client(), &request).await {
            SubmitOutcome::Failed(notice) => {
                assert!(notice.destructive);
                assert_eq!(notice.description, "It's on us, please try again later");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
