use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::document::ResumeContent;
use crate::errors::AppError;
use crate::models::resume::{ResumeRow, ResumeTemplateRow};
use crate::routes::caller::{access_token, Caller};
use crate::state::AppState;
use crate::store::{ContentStore, NewResume, ResumeError};

const FALLBACK_TEMPLATE_NAME: &str = "템플릿";

#[derive(Serialize)]
pub struct CreatedResume {
    pub resume: ResumeRow,
    /// Where the client should go next.
    pub editor_path: String,
}

/// Title given to a résumé created from a template.
pub fn new_resume_title(template_name: Option<&str>) -> String {
    let name = template_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(FALLBACK_TEMPLATE_NAME);
    format!("새 이력서 (템플릿: {name})")
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ResumeTemplateRow>>, AppError> {
    let token = access_token(&headers);
    let store = ContentStore::new(state.remote(token.as_deref()).data);
    let templates = store.fetch_templates().await;
    if let Some(error) = store.snapshot().error {
        return Err(error.into());
    }
    Ok(Json(templates))
}

/// POST /api/v1/templates/:template_id/resumes
///
/// Creates an empty résumé bound to the template.
pub async fn handle_create_from_template(
    caller: Caller,
    Path(template_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let store = caller.content_store();
    let templates = store.fetch_templates().await;
    let name = templates
        .iter()
        .find(|t| t.id == template_id)
        .map(|t| t.name.as_str());

    let created = store
        .create_resume(NewResume {
            title: new_resume_title(name),
            content: ResumeContent::default(),
            template_id: Some(template_id),
            user_id: caller.user.id,
        })
        .await;

    let Some(resume) = created else {
        let error = store
            .snapshot()
            .error
            .unwrap_or(ResumeError::CreateFailed("no row returned".to_string()));
        return Err(error.into());
    };

    info!("User {} created resume {} from template {template_id}", caller.user.id, resume.id);
    let editor_path = format!("/editor/{}", resume.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, editor_path.clone())],
        Json(CreatedResume {
            resume,
            editor_path,
        }),
    )
        .into_response())
}
