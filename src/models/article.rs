use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{id_from_any, optional_id_from_any, require, string_or_null, Category, FieldErrors, User, ValidationError};
use crate::filter::Searchable;

const EXCERPT_LENGTH: usize = 150;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub excerpt: String,
    #[serde(deserialize_with = "id_from_any")]
    pub category_id: String,
    #[serde(default, deserialize_with = "optional_id_from_any")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Searchable for Article {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.content, &self.excerpt]
    }

    fn category_id(&self) -> Option<&str> {
        Some(&self.category_id)
    }
}

/// Body for article create and update requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "id_from_any")]
    pub category_id: String,
}

impl ArticleDraft {
    /// Checks required fields before anything is sent
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut field_errors = FieldErrors::new();
        require(&mut field_errors, "title", &self.title);
        require(&mut field_errors, "content", &self.content);
        require(&mut field_errors, "categoryId", &self.category_id);

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new("Missing required fields", field_errors))
        }
    }

    /// Fills in an excerpt from the content when none was given
    pub fn with_derived_excerpt(mut self) -> Self {
        let missing = self.excerpt.as_deref().map(str::trim).map_or(true, str::is_empty);
        if missing {
            self.excerpt = Some(derive_excerpt(&self.content, EXCERPT_LENGTH));
        }
        self
    }
}

/// Cuts `content` down to at most `max_chars` characters, preferring a word boundary
pub fn derive_excerpt(content: &str, max_chars: usize) -> String {
    let content = content.trim();
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let cut: String = content.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => cut[..idx].trim_end(),
        _ => cut.as_str(),
    };
    format!("{}...", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, matches, FilterCriteria};
    use serde_json::json;

    #[test]
    fn article_parses_backend_shape() {
        let article: Article = serde_json::from_value(json!({
            "id": 3,
            "title": "Hello",
            "content": "World",
            "excerpt": "W",
            "categoryId": 2,
            "userId": 1,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-02T10:00:00Z",
            "category": { "id": 2, "name": "News", "userId": 1 },
            "user": { "id": 1, "username": "ana", "role": "Admin" }
        }))
        .unwrap();

        assert_eq!(article.id, "3");
        assert_eq!(article.category_id, "2");
        assert_eq!(article.category.as_ref().map(|c| c.name.as_str()), Some("News"));
        assert!(article.created_at.is_some());
    }

    #[test]
    fn null_excerpt_reads_as_empty() {
        let article: Article = serde_json::from_value(json!({
            "id": 1,
            "title": "t",
            "content": "c",
            "excerpt": null,
            "categoryId": 1,
            "createdAt": null
        }))
        .unwrap();
        assert_eq!(article.excerpt, "");

        let listing: Vec<Article> = serde_json::from_value(json!([
            { "id": 1, "title": "a", "content": "b", "excerpt": null, "categoryId": 1 },
            { "id": 2, "title": "c", "content": "d", "categoryId": 1 }
        ]))
        .unwrap();
        assert_eq!(listing.len(), 2);
    }

    fn article(title: &str, content: &str, excerpt: &str) -> Article {
        serde_json::from_value(json!({
            "id": 1,
            "title": title,
            "content": content,
            "excerpt": excerpt,
            "categoryId": 1
        }))
        .unwrap()
    }

    #[test]
    fn search_reaches_content_and_excerpt() {
        let in_content = article("Weekly notes", "Ownership and the BORROW checker", "A summary");
        let in_excerpt = article("Weekly notes", "Nothing here", "On borrowing");
        let in_neither = article("Weekly notes", "Nothing here", "A summary");
        let articles = vec![in_content.clone(), in_excerpt.clone(), in_neither];

        let found = filter(&articles, &FilterCriteria::new("Borrow"));
        assert_eq!(found, vec![in_content, in_excerpt]);

        assert!(filter(&articles, &FilterCriteria::new("lifetimes")).is_empty());
    }

    #[test]
    fn category_filter_uses_category_id() {
        let article = article("t", "c", "e");
        assert!(matches(&article, &FilterCriteria::default().with_category("1")));
        assert!(!matches(&article, &FilterCriteria::default().with_category("2")));
    }

    #[test]
    fn draft_validation_lists_missing_fields() {
        let draft = ArticleDraft {
            title: "  ".into(),
            content: "body".into(),
            excerpt: None,
            category_id: String::new(),
        };

        let err = draft.validate().unwrap_err();
        assert!(err.field_errors.contains_key("title"));
        assert!(err.field_errors.contains_key("categoryId"));
        assert!(!err.field_errors.contains_key("content"));
    }

    #[test]
    fn excerpt_is_derived_on_word_boundary() {
        let content = "word ".repeat(60);
        let excerpt = derive_excerpt(&content, 12);
        assert_eq!(excerpt, "word word...");

        assert_eq!(derive_excerpt("short", 150), "short");
    }

    #[test]
    fn explicit_excerpt_is_kept() {
        let draft = ArticleDraft {
            title: "t".into(),
            content: "a long body".into(),
            excerpt: Some("mine".into()),
            category_id: "1".into(),
        }
        .with_derived_excerpt();
        assert_eq!(draft.excerpt.as_deref(), Some("mine"));
    }
}
