use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tracing::debug;
use uuid::{Uuid, Variant};

use crate::errors::AppError;
use crate::routes::caller::Caller;
use crate::routes::resumes::ResumeDocument;
use crate::store::ResumeError;

/// Accepts only the canonical hyphenated form of an RFC 4122 UUID,
/// versions 1 through 5.
pub fn editor_resume_id(segment: &str) -> Option<Uuid> {
    if segment.len() != 36 {
        return None;
    }
    let id = Uuid::try_parse(segment).ok()?;
    let supported = id.get_variant() == Variant::RFC4122 && (1..=5).contains(&id.get_version_num());
    supported.then_some(id)
}

/// GET /editor/:resume_id
///
/// `new` goes to the template picker, malformed ids and résumés the caller
/// cannot see go to the not-found page.
pub async fn handle_editor_page(
    caller: Result<Caller, AppError>,
    Path(resume_id): Path<String>,
) -> Result<Response, AppError> {
    if resume_id == "new" {
        return Ok(Redirect::to("/templates").into_response());
    }
    let Some(id) = editor_resume_id(&resume_id) else {
        debug!("Editor opened with malformed id {resume_id:?}");
        return Ok(Redirect::to("/not-found").into_response());
    };
    let caller = match caller {
        Ok(caller) => caller,
        Err(AppError::Unauthorized) => {
            return Ok(Redirect::to(&format!("/login?next=/editor/{id}")).into_response());
        }
        Err(other) => return Err(other),
    };

    let store = caller.content_store();
    if store.fetch_resume_by_id(id).await.is_none() {
        return match store.snapshot().error {
            Some(ResumeError::NotFound) | None => Ok(Redirect::to("/not-found").into_response()),
            Some(error) => Err(error.into()),
        };
    }

    let document = ResumeDocument::from_store(&store)?;
    // Leave nothing behind for the next résumé this store might load.
    store.clear_current();
    Ok(Json(document).into_response())
}

/// GET /not-found, and the router fallback.
pub async fn handle_not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::Utc;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::models::user::AuthUser;
    use crate::remote::fake::FakeBackend;
    use crate::routes::test_support::{app, body_json};

    fn get(uri: &str, user: Option<&AuthUser>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, format!("sb-access-token=token-{}", user.id));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_editor_resume_id_format() {
        assert!(editor_resume_id("3f2b8c1e-9d4a-4c6b-8e2f-1a2b3c4d5e6f").is_some());
        assert!(editor_resume_id("3F2B8C1E-9D4A-4C6B-AE2F-1A2B3C4D5E6F").is_some());
        // version 7
        assert!(editor_resume_id("3f2b8c1e-9d4a-7c6b-8e2f-1a2b3c4d5e6f").is_none());
        // variant bits 11xx
        assert!(editor_resume_id("3f2b8c1e-9d4a-4c6b-ce2f-1a2b3c4d5e6f").is_none());
        assert!(editor_resume_id("3f2b8c1e9d4a4c6b8e2f1a2b3c4d5e6f").is_none());
        assert!(editor_resume_id("not-a-uuid").is_none());
    }

    #[tokio::test]
    async fn test_new_and_malformed_redirect() {
        let backend = FakeBackend::new();

        let response = app(&backend).oneshot(get("/editor/new", None)).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/templates");

        let response = app(&backend).oneshot(get("/editor/1234", None)).await.unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/not-found");
    }

    #[tokio::test]
    async fn test_anonymous_editor_goes_to_login() {
        let backend = FakeBackend::new();
        let id = Uuid::new_v4();
        let response = app(&backend)
            .oneshot(get(&format!("/editor/{id}"), None))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::LOCATION],
            format!("/login?next=/editor/{id}").as_str()
        );
    }

    #[tokio::test]
    async fn test_foreign_resume_redirects_to_not_found() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let other = backend.add_account("other@example.com", "secret1").await;
        let theirs = backend.seed_resume(other.id, "theirs", json!({}), Utc::now()).await;

        let response = app(&backend)
            .oneshot(get(&format!("/editor/{}", theirs.id), Some(&me)))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::LOCATION], "/not-found");
    }

    #[tokio::test]
    async fn test_editor_renders_document() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let row = backend
            .seed_resume(me.id, "cv", json!({"education": [{"id": "e1", "school_name": "한국대학교"}]}), Utc::now())
            .await;

        let response = app(&backend)
            .oneshot(get(&format!("/editor/{}", row.id), Some(&me)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["resume"]["id"], json!(row.id));
        assert_eq!(body["content"]["education"][0]["school_name"], "한국대학교");
        assert_eq!(body["sections"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_load_failure_shows_error() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        let router = app(&backend);
        backend.fail_reads.store(true, Ordering::SeqCst);

        let response = router
            .oneshot(get(&format!("/editor/{}", Uuid::new_v4()), Some(&me)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_auth_outage_is_not_a_login_redirect() {
        let backend = FakeBackend::new();
        let me = backend.add_account("me@example.com", "secret1").await;
        backend.fail_auth.store(true, Ordering::SeqCst);

        let response = app(&backend)
            .oneshot(get(&format!("/editor/{}", Uuid::new_v4()), Some(&me)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(!response.headers().contains_key(header::LOCATION));
    }

    #[tokio::test]
    async fn test_unknown_routes_are_404_json() {
        let backend = FakeBackend::new();
        for uri in ["/not-found", "/no/such/page"] {
            let response = app(&backend).oneshot(get(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body = body_json(response).await;
            assert_eq!(body["error"]["code"], "NOT_FOUND");
        }
    }
}
