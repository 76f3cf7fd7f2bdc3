pub mod generate;
pub mod health;
pub mod images;
pub mod messages;
pub mod projects;
pub mod reference_images;

use crate::db::queries::{self, ProjectRecord};
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub(crate) async fn require_project(
    state: &AppState,
    project_id: Uuid,
) -> Result<ProjectRecord, AppError> {
    queries::get_project(&state.db, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {} not found", project_id)))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Projects
        .route(
            "/projects",
            post(projects::create_project)
                .get(projects::list_projects)
                .delete(projects::delete_project),
        )
        // Reference images
        .route(
            "/projects/{id}/reference-images",
            post(reference_images::upload).get(reference_images::list),
        )
        .route(
            "/projects/{id}/reference-images/{image_id}",
            axum::routing::patch(reference_images::update).delete(reference_images::remove),
        )
        // Generated images & conversation
        .route("/projects/{id}/images", get(images::list))
        .route(
            "/projects/{id}/images/{image_id}",
            axum::routing::delete(images::remove),
        )
        .route("/projects/{id}/messages", get(messages::list))
        // Generation
        .route("/generate-image", post(generate::generate_image))
        .route("/generate-views", post(generate::generate_views))
        // Health
        .route("/health", get(health::health_check))
        // Middleware layers (applied bottom-up)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
