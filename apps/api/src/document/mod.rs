//! Résumé document model — the JSON stored in `resumes.content`.
//!
//! Every field is optional except the list containers (absent == empty) and
//! `custom_sections[].section_title`. A freshly created résumé holds `{}`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub mod merge;
pub mod sections;

pub use merge::ContentPatch;
pub use sections::{SectionKind, SectionSlot};

/// Personal details shown in the résumé header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    /// e.g. `학사`, `석사`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    /// `YYYY-MM` or `YYYY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Empty while still enrolled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Free text such as `3.8/4.5`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// `Present` or empty for a current position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Markdown, may span lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_current: Option<bool>,
}

/// Proficiency label. The editor offers `상`/`중`/`하` but any text is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SkillLevel {
    High,
    Medium,
    Low,
    Other(String),
}

impl SkillLevel {
    pub fn as_str(&self) -> &str {
        match self {
            SkillLevel::High => "상",
            SkillLevel::Medium => "중",
            SkillLevel::Low => "하",
            SkillLevel::Other(label) => label,
        }
    }
}

impl From<String> for SkillLevel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "상" => SkillLevel::High,
            "중" => SkillLevel::Medium,
            "하" => SkillLevel::Low,
            _ => SkillLevel::Other(label),
        }
    }
}

impl From<SkillLevel> for String {
    fn from(level: SkillLevel) -> Self {
        match level {
            SkillLevel::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<SkillLevel>,
    /// e.g. `Frontend`, `Backend`, `Language`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies_used: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_achievements: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomSectionItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
}

/// A user-defined section with its own title and item list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomSection {
    pub id: String,
    pub section_title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<CustomSectionItem>,
}

/// The full résumé body.
///
/// Keys this model does not know about are carried in `extra` so that a
/// wholesale save writes them back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<EducationItem>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub experience: Vec<ExperienceItem>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<SkillItem>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectItem>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub cover_letters: Vec<CoverLetter>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub custom_sections: Vec<CustomSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Section keys or custom section ids, in display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_order: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses serialized content. Malformed or non-object input yields `None`.
pub fn parse(raw: &str) -> Option<ResumeContent> {
    match serde_json::from_str(raw) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!("Discarding unparseable resume content: {e}");
            None
        }
    }
}

/// Parses the `content` column, which holds either a JSON object or the same
/// object serialized as a JSON string.
pub fn parse_value(raw: &Value) -> Option<ResumeContent> {
    match raw {
        Value::Null => None,
        Value::String(text) => parse(text),
        other => match ResumeContent::deserialize(other) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!("Discarding unparseable resume content: {e}");
                None
            }
        },
    }
}

/// Serializes content to the text form written to `resumes.content`.
pub fn serialize(content: &ResumeContent) -> Result<String, serde_json::Error> {
    serde_json::to_string(content)
}

/// Splits the comma-separated technologies input into trimmed entries.
pub fn parse_technologies(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
