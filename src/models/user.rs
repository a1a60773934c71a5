use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: Option<String>,
    #[serde(skip_serializing, default)]
    pub email: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub facebook_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown next to posts and comments.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

/// Account row as provisioned by the sign-in collaborator.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

impl NewUser {
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            email: None,
            image: None,
        }
    }
}

pub(crate) static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid slug pattern"));

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("Username may only contain letters, numbers and underscores".into()))
    }
}

fn validate_social_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Ok(());
    }
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("url").with_message("Please enter a valid URL".into())),
    }
}

#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUrls {
    #[validate(custom(function = "validate_social_url"))]
    pub linked_in: Option<String>,
    #[validate(custom(function = "validate_social_url"))]
    pub github: Option<String>,
    #[validate(custom(function = "validate_social_url"))]
    pub facebook: Option<String>,
}

// Update profile request
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(max = 160, message = "Bio must not be longer than 160 characters"))]
    pub bio: Option<String>,
    #[validate(nested)]
    pub urls: Option<ProfileUrls>,
}

/// Normalized profile write: blank strings are stored as NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub facebook_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        let urls = request.urls.unwrap_or_default();
        Self {
            username: request.username.trim().to_string(),
            bio: non_blank(request.bio),
            linkedin_url: non_blank(urls.linked_in),
            github_url: non_blank(urls.github),
            facebook_url: non_blank(urls.facebook),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str) -> UpdateProfileRequest {
        UpdateProfileRequest {
            username: username.to_string(),
            bio: None,
            urls: None,
        }
    }

    #[test]
    fn username_rules() {
        assert!(request("ferris_42").validate().is_ok());
        assert!(request("ab").validate().is_err());
        assert!(request("has space").validate().is_err());
    }

    #[test]
    fn social_urls_accept_blank_and_reject_garbage() {
        let mut req = request("ferris");
        req.urls = Some(ProfileUrls {
            linked_in: Some(String::new()),
            github: Some("https://github.com/ferris".to_string()),
            facebook: None,
        });
        assert!(req.validate().is_ok());

        req.urls = Some(ProfileUrls {
            linked_in: Some("not a url".to_string()),
            ..Default::default()
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn profile_update_drops_blank_fields() {
        let update = ProfileUpdate::from(UpdateProfileRequest {
            username: " ferris ".to_string(),
            bio: Some("   ".to_string()),
            urls: Some(ProfileUrls {
                linked_in: Some(String::new()),
                github: Some("https://github.com/ferris".to_string()),
                facebook: None,
            }),
        });
        assert_eq!(update.username, "ferris");
        assert_eq!(update.bio, None);
        assert_eq!(update.linkedin_url, None);
        assert_eq!(update.github_url.as_deref(), Some("https://github.com/ferris"));
    }
}
