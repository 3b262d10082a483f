use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::document::{self, ResumeContent};

/// A row of `resumes`. `content` is kept raw: the column may hold a JSON
/// object or its serialized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    pub fn parsed_content(&self) -> Option<ResumeContent> {
        document::parse_value(&self.content)
    }
}

/// Insert payload for `resumes`.
#[derive(Debug, Clone, Serialize)]
pub struct NewResumeRow {
    pub user_id: Uuid,
    pub title: String,
    /// Serialized `ResumeContent`.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
}

/// Wholesale save payload. There is no version column: the last write wins.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeUpdate {
    pub content: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// A row of the read-only `resume_templates` catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeTemplateRow {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
