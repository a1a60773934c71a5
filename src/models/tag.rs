use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

pub const MAX_TAG_LENGTH: usize = 32;

/// Canonical tag name: trimmed, lowercase, inner whitespace collapsed to `-`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let name = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    if name.is_empty() || name.chars().count() > MAX_TAG_LENGTH {
        None
    } else {
        Some(name)
    }
}

/// Normalizes and de-duplicates tag names, keeping first-seen order.
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw.iter().filter_map(|r| normalize_tag(r)) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_dedupes() {
        let raw = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "web  dev".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_tags(&raw), vec!["rust", "web-dev"]);
    }

    #[test]
    fn rejects_overlong_tags() {
        assert_eq!(normalize_tag(&"x".repeat(MAX_TAG_LENGTH + 1)), None);
    }
}
