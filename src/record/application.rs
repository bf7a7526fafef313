//! Application records (agent-facing application forms)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{RecordError, RecordResult};
use super::model::{flexible_date, require_text, RecordAttributes};
use super::query::FilterExpr;

/// Scalar attributes of an application form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    pub is_active: bool,
    #[serde(with = "flexible_date")]
    pub expiry_date: DateTime<Utc>,
    /// Subject of the token that created the application
    pub created_by: String,
}

/// Create input; `createdBy` defaults to the authenticated agent
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    pub is_active: bool,
    #[serde(with = "flexible_date")]
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rules: Option<Vec<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "flexible_date::option::deserialize")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl RecordAttributes for Application {
    type Input = ApplicationInput;
    type Patch = ApplicationPatch;

    const COLLECTION: &'static str = "applications";
    const LABEL: &'static str = "Application";
    const UNIQUE_FIELD: &'static str = "title";

    fn from_input(input: ApplicationInput, actor: &str) -> RecordResult<Self> {
        require_text("title", &input.title)?;
        let created_by = input.created_by.unwrap_or_else(|| actor.to_string());
        require_text("createdBy", &created_by)?;

        Ok(Application {
            title: input.title,
            description: input.description,
            rules: input.rules,
            is_active: input.is_active,
            expiry_date: input.expiry_date,
            created_by,
        })
    }

    fn apply_patch(&mut self, patch: ApplicationPatch) -> RecordResult<()> {
        if let Some(title) = patch.title {
            require_text("title", &title)?;
            self.title = title;
        }
        if let Some(v) = patch.description {
            self.description = Some(v);
        }
        if let Some(v) = patch.rules {
            self.rules = v;
        }
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        if let Some(v) = patch.expiry_date {
            self.expiry_date = v;
        }
        Ok(())
    }

    fn unique_key(&self) -> &str {
        &self.title
    }

    fn filter(key: &str, value: &str) -> RecordResult<Option<FilterExpr>> {
        let filter = match key {
            "title" => FilterExpr::contains("title", value),
            "createdBy" => FilterExpr::eq("createdBy", json!(value)),
            "isActive" => {
                let flag: bool = value.parse().map_err(|_| {
                    RecordError::InvalidQuery(format!("isActive must be true or false, got '{}'", value))
                })?;
                FilterExpr::eq("isActive", json!(flag))
            }
            _ => return Ok(None),
        };
        Ok(Some(filter))
    }
}
