use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{FeedPost, user::SLUG_RE};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Forum {
    pub id: Uuid,
    pub name: String,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: Uuid,
    pub forum_id: Uuid,
    pub created_at: DateTime<Utc>,
}

fn validate_forum_name(name: &str) -> Result<(), ValidationError> {
    // The name doubles as the URL slug.
    if SLUG_RE.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("forum_name").with_message(
            "Forum name may only contain letters, numbers and underscores".into(),
        ))
    }
}

// Create forum request
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateForumRequest {
    #[validate(
        length(min = 3, max = 21, message = "Forum name must be between 3 and 21 characters"),
        custom(function = "validate_forum_name")
    )]
    pub name: String,
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub forum_id: Uuid,
}

/// Everything the forum layout and feed need for one render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumDetails {
    pub forum: Forum,
    pub posts: Vec<FeedPost>,
    pub member_count: i64,
    pub creator_name: Option<String>,
    pub is_subscribed: bool,
    pub is_creator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopCommunity {
    pub forum_name: String,
    pub member_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forum_names_are_slug_safe() {
        let ok = CreateForumRequest {
            name: "golang".to_string(),
        };
        assert!(ok.validate().is_ok());

        for bad in ["go", "has space", "dash-ed", "a_very_long_forum_name_indeed"] {
            let req = CreateForumRequest {
                name: bad.to_string(),
            };
            assert!(req.validate().is_err(), "{bad} should be rejected");
        }
    }
}
