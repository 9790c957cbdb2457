pub mod article;
pub mod category;
pub mod user;

pub use article::{Article, ArticleDraft};
pub use category::{delete_failure_message, Category, CategoryDraft};
pub use user::{AuthResponse, Credentials, Registration, Role, User};

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Field-level validation failures keyed by wire field name
pub type FieldErrors = HashMap<String, String>;

/// Required fields missing from a draft; raised before any request is dispatched
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: FieldErrors,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self {
            message: message.into(),
            field_errors,
        }
    }

    /// Field names in a stable order, for display
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.field_errors.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }
}

/// Backend ids show up as JSON numbers on some endpoints and strings on others.
/// Both are held as strings so filtering by `categoryId` is a plain comparison.
pub(crate) fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AnyId {
        Str(String),
        Num(i64),
    }

    Ok(match AnyId::deserialize(deserializer)? {
        AnyId::Str(s) => s,
        AnyId::Num(n) => n.to_string(),
    })
}

pub(crate) fn optional_id_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AnyId {
        Str(String),
        Num(i64),
    }

    Ok(Option::<AnyId>::deserialize(deserializer)?.map(|id| match id {
        AnyId::Str(s) => s,
        AnyId::Num(n) => n.to_string(),
    }))
}

/// Treats an explicit `null` like a missing string
pub(crate) fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn require(field_errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        field_errors.insert(field.to_string(), "This field is required".to_string());
    }
}
