pub mod auth;
pub mod caller;
pub mod health;
pub mod pages;
pub mod resumes;
pub mod templates;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/callback", get(auth::handle_callback))
        .route("/auth/login", post(auth::handle_login))
        .route("/auth/signup", post(auth::handle_signup))
        .route("/auth/logout", post(auth::handle_logout))
        .route("/api/v1/me", get(auth::handle_me))
        // Templates
        .route("/api/v1/templates", get(templates::handle_list_templates))
        .route(
            "/api/v1/templates/:template_id/resumes",
            post(templates::handle_create_from_template),
        )
        // Resumes
        .route("/api/v1/resumes", get(resumes::handle_list_resumes))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume)
                .put(resumes::handle_save_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/sections/:section/items",
            post(resumes::handle_add_item),
        )
        .route(
            "/api/v1/resumes/:id/sections/:section/items/:item_id",
            patch(resumes::handle_update_item).delete(resumes::handle_delete_item),
        )
        .route("/api/v1/resumes/:id/pdf", get(resumes::handle_export_pdf))
        // Pages
        .route("/editor/:resume_id", get(pages::handle_editor_page))
        .route("/not-found", get(pages::handle_not_found))
        .fallback(pages::handle_not_found)
        .with_state(state)
}
