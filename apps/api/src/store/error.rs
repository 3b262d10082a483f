use thiserror::Error;

/// Failures the stores absorb into their `error` field. Each carries the text
/// shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResumeError {
    #[error("Resume not found")]
    NotFound,

    #[error("Failed to create resume: {0}")]
    CreateFailed(String),

    #[error("Failed to save resume: {0}")]
    SaveFailed(String),

    #[error("Failed to delete resume: {0}")]
    DeleteFailed(String),

    #[error("Failed to load resumes: {0}")]
    LoadFailed(String),

    #[error("Failed to load templates: {0}")]
    TemplatesFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Resume content is not valid JSON")]
    ParseFailed,
}
