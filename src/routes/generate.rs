use crate::error::AppError;
use crate::models::{
    GenerateImageRequest, GenerateImageResponse, GenerateViewsRequest, GenerateViewsResponse,
    ViewResponse,
};
use crate::pipeline::{chat, views};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

/// POST /generate-image — conversational base-image generation.
pub async fn generate_image(
    State(state): State<AppState>,
    Json(req): Json<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>, AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".into()));
    }

    let image = chat::generate_from_prompt(
        &state,
        req.project_id,
        &req.prompt,
        req.reference_image_id,
    )
    .await?;

    Ok(Json(GenerateImageResponse {
        id: image.id,
        image_url: image.image_url,
        prompt: image.prompt,
        text: image.text,
    }))
}

/// POST /generate-views — derive front/side/top/bottom views from a base
/// image. Returns the views that succeeded; partial batches are normal.
pub async fn generate_views(
    State(state): State<AppState>,
    Json(req): Json<GenerateViewsRequest>,
) -> Result<Json<GenerateViewsResponse>, AppError> {
    let result = views::generate_view_set(&state, req.project_id, req.base_image_id).await?;

    Ok(Json(GenerateViewsResponse {
        views: result
            .views
            .into_iter()
            .map(|v| ViewResponse {
                id: v.id,
                view_type: v.view_type,
                image_url: v.image_url,
            })
            .collect(),
        view_set_id: result.view_set_id,
    }))
}
