use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{id_from_any, optional_id_from_any, require, FieldErrors, ValidationError};
use crate::filter::Searchable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "optional_id_from_any")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Searchable for Category {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryDraft {
    #[serde(default)]
    pub name: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut field_errors = FieldErrors::new();
        require(&mut field_errors, "name", &self.name);

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new("Category name is required", field_errors))
        }
    }
}

/// User-facing message for a failed category delete, keyed by HTTP status
pub fn delete_failure_message(status: u16) -> Option<&'static str> {
    match status {
        404 => Some("Category not found"),
        409 => Some("Category is in use by existing articles"),
        _ => None,
    }
}
