use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::document::{ContentPatch, ResumeContent, SectionSlot};
use crate::editor::{by_key, ItemKey};
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::routes::caller::Caller;
use crate::store::{ContentStore, ResumeDetailsPatch, ResumeError};

/// A résumé as the editor renders it.
#[derive(Debug, Serialize)]
pub struct ResumeDocument {
    pub resume: ResumeRow,
    /// `None` when the stored content could not be read.
    pub content: Option<ResumeContent>,
    pub sections: Vec<SectionSlot>,
}

impl ResumeDocument {
    pub fn from_store(store: &ContentStore) -> Result<Self, AppError> {
        let state = store.snapshot();
        let resume = state.current_resume.ok_or(ResumeError::NotFound)?;
        let sections = state
            .current_content
            .as_ref()
            .map(ResumeContent::display_order)
            .unwrap_or_default();
        Ok(Self {
            resume,
            content: state.current_content,
            sections,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub content: Option<ContentPatch>,
}

#[derive(Serialize)]
pub struct ItemCreated {
    pub id: String,
    pub document: ResumeDocument,
}

fn last_error(store: &ContentStore, fallback: ResumeError) -> AppError {
    store.snapshot().error.unwrap_or(fallback).into()
}

/// Loads `id` into the store's current slot.
pub async fn load(store: &ContentStore, id: Uuid) -> Result<ResumeRow, AppError> {
    match store.fetch_resume_by_id(id).await {
        Some(row) => Ok(row),
        None => Err(last_error(store, ResumeError::NotFound)),
    }
}

async fn save(store: &ContentStore) -> Result<(), AppError> {
    if store.save().await {
        Ok(())
    } else {
        Err(last_error(
            store,
            ResumeError::SaveFailed("no resume loaded".to_string()),
        ))
    }
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(caller: Caller) -> Result<Json<Vec<ResumeRow>>, AppError> {
    let store = caller.content_store();
    let rows = store.fetch_resumes(caller.user.id).await;
    if let Some(error) = store.snapshot().error {
        return Err(error.into());
    }
    Ok(Json(rows))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDocument>, AppError> {
    let store = caller.content_store();
    load(&store, id).await?;
    Ok(Json(ResumeDocument::from_store(&store)?))
}

/// PUT /api/v1/resumes/:id
///
/// Applies the patch to the stored résumé and writes it back whole.
pub async fn handle_save_resume(
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<ResumeDocument>, AppError> {
    let store = caller.content_store();
    load(&store, id).await?;

    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
    }
    // Saving writes the content back whole, so it has to be readable even
    // when only the title changes.
    if store.current_content().is_none() {
        return Err(ResumeError::ParseFailed.into());
    }
    store.update_current_details(ResumeDetailsPatch {
        title: req.title,
        template_id: req.template_id,
    });
    if let Some(patch) = req.content.filter(|p| !p.is_empty()) {
        if !store.update_current_content(patch) {
            return Err(ResumeError::ParseFailed.into());
        }
    }

    save(&store).await?;
    info!("User {} saved resume {id}", caller.user.id);
    Ok(Json(ResumeDocument::from_store(&store)?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let store = caller.content_store();
    load(&store, id).await?;
    if !store.delete_resume(id).await {
        return Err(last_error(
            &store,
            ResumeError::DeleteFailed("delete rejected".to_string()),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/sections/:section/items
pub async fn handle_add_item(
    caller: Caller,
    Path((id, section)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let store = caller.content_store();
    load(&store, id).await?;
    let item_id = by_key::add_item(&store, &section)?;
    save(&store).await?;

    let body = ItemCreated {
        id: item_id,
        document: ResumeDocument::from_store(&store)?,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// PATCH /api/v1/resumes/:id/sections/:section/items/:item_id
///
/// Body: `{"field": "<name>", "value": <new value>}`.
pub async fn handle_update_item(
    caller: Caller,
    Path((id, section, item)): Path<(Uuid, String, String)>,
    Json(field): Json<Value>,
) -> Result<Json<ResumeDocument>, AppError> {
    let store = caller.content_store();
    load(&store, id).await?;
    by_key::update_item(&store, &section, ItemKey::from_path(&item), field)?;
    save(&store).await?;
    Ok(Json(ResumeDocument::from_store(&store)?))
}

/// DELETE /api/v1/resumes/:id/sections/:section/items/:item_id
pub async fn handle_delete_item(
    caller: Caller,
    Path((id, section, item)): Path<(Uuid, String, String)>,
) -> Result<Json<ResumeDocument>, AppError> {
    let store = caller.content_store();
    load(&store, id).await?;
    by_key::delete_item(&store, &section, ItemKey::from_path(&item))?;
    save(&store).await?;
    Ok(Json(ResumeDocument::from_store(&store)?))
}

/// GET /api/v1/resumes/:id/pdf
pub async fn handle_export_pdf(Path(_id): Path<Uuid>) -> Result<(), AppError> {
    Err(AppError::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::models::user::AuthUser;
    use crate::remote::fake::FakeBackend;
    use crate::routes::test_support::{app, body_json};

    fn request(method: &str, uri: &str, user: &AuthUser, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer token-{}", user.id));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_owned_only() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let other = backend.add_account("other@example.com", "secret1").await;
        let now = Utc::now();
        backend.seed_resume(me.id, "old", json!({}), now - Duration::hours(3)).await;
        backend.seed_resume(me.id, "new", json!({}), now).await;
        backend.seed_resume(other.id, "theirs", json!({}), now).await;

        let response = app(&backend)
            .oneshot(request("GET", "/api/v1/resumes", &me, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_bad_gateway() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let router = app(&backend);
        backend.fail_reads.store(true, Ordering::SeqCst);

        let response = router
            .oneshot(request("GET", "/api/v1/resumes", &me, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "STORE_ERROR");
    }

    #[tokio::test]
    async fn test_foreign_resume_is_404() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let other = backend.add_account("other@example.com", "secret1").await;
        let theirs = backend.seed_resume(other.id, "theirs", json!({}), Utc::now()).await;

        let response = app(&backend)
            .oneshot(request("GET", &format!("/api/v1/resumes/{}", theirs.id), &me, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_returns_content_and_section_order() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let row = backend
            .seed_resume(
                me.id,
                "cv",
                json!("{\"skills\":[{\"id\":\"s1\",\"name\":\"Rust\",\"level\":\"상\"}],\"sections_order\":[\"skills\"]}"),
                Utc::now(),
            )
            .await;

        let response = app(&backend)
            .oneshot(request("GET", &format!("/api/v1/resumes/{}", row.id), &me, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["content"]["skills"][0]["level"], "상");
        assert_eq!(body["sections"][0], json!({"kind": "builtin", "key": "skills"}));
    }

    #[tokio::test]
    async fn test_put_merges_and_saves() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let row = backend
            .seed_resume(me.id, "cv", json!({"personal_info": {"name": "김민준"}}), Utc::now())
            .await;

        let response = app(&backend)
            .oneshot(request(
                "PUT",
                &format!("/api/v1/resumes/{}", row.id),
                &me,
                Some(json!({
                    "title": "백엔드 이력서",
                    "content": {"personal_info": {"email": "minjun@example.com"}}
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let stored = backend.stored_resume(row.id).await.unwrap();
        assert_eq!(stored.title, "백엔드 이력서");
        let info = stored.parsed_content().unwrap().personal_info.unwrap();
        assert_eq!(info.name.as_deref(), Some("김민준"));
        assert_eq!(info.email.as_deref(), Some("minjun@example.com"));
    }

    #[tokio::test]
    async fn test_put_onto_unreadable_content_is_422() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let row = backend.seed_resume(me.id, "cv", json!("{oops"), Utc::now()).await;

        let response = app(&backend)
            .oneshot(request(
                "PUT",
                &format!("/api/v1/resumes/{}", row.id),
                &me,
                Some(json!({"content": {"skills": []}})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(backend.update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_title_only_put_onto_unreadable_content_is_422() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let row = backend.seed_resume(me.id, "cv", json!("{oops"), Utc::now()).await;

        for body in [json!({"title": "new"}), json!({"title": "new", "content": {}})] {
            let response = app(&backend)
                .oneshot(request(
                    "PUT",
                    &format!("/api/v1/resumes/{}", row.id),
                    &me,
                    Some(body),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = body_json(response).await;
            assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
        }
        assert_eq!(backend.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.stored_resume(row.id).await.unwrap().title, "cv");
    }

    #[tokio::test]
    async fn test_item_routes() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let row = backend.seed_resume(me.id, "cv", json!({}), Utc::now()).await;
        let base = format!("/api/v1/resumes/{}/sections/education/items", row.id);

        let response = app(&backend)
            .oneshot(request("POST", &base, &me, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let item_id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app(&backend)
            .oneshot(request(
                "PATCH",
                &format!("{base}/{item_id}"),
                &me,
                Some(json!({"field": "school_name", "value": "한국대학교"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let saved = backend.stored_resume(row.id).await.unwrap().parsed_content().unwrap();
        assert_eq!(saved.education.len(), 1);
        assert_eq!(saved.education[0].school_name.as_deref(), Some("한국대학교"));

        let response = app(&backend)
            .oneshot(request(
                "PATCH",
                &format!("{base}/{item_id}"),
                &me,
                Some(json!({"field": "salary", "value": "1"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(&backend)
            .oneshot(request("DELETE", &format!("{base}/{item_id}"), &me, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let saved = backend.stored_resume(row.id).await.unwrap().parsed_content().unwrap();
        assert!(saved.education.is_empty());

        let response = app(&backend)
            .oneshot(request(
                "POST",
                &format!("/api/v1/resumes/{}/sections/hobbies/items", row.id),
                &me,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_resume() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let row = backend.seed_resume(me.id, "cv", json!({}), Utc::now()).await;

        let response = app(&backend)
            .oneshot(request("DELETE", &format!("/api/v1/resumes/{}", row.id), &me, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(backend.stored_resume(row.id).await.is_none());
    }

    #[tokio::test]
    async fn test_pdf_export_is_not_implemented() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let response = app(&backend)
            .oneshot(request(
                "GET",
                &format!("/api/v1/resumes/{}/pdf", Uuid::new_v4()),
                &me,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
