use crate::db::queries;
use crate::error::AppError;
use crate::models::GeneratedImageResponse;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListImagesQuery {
    #[serde(default)]
    pub base_only: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ListImagesQuery>,
) -> Result<Json<Vec<GeneratedImageResponse>>, AppError> {
    super::require_project(&state, project_id).await?;

    let records = queries::list_generated_images(&state.db, project_id, query.base_only).await?;
    let mut data = Vec::with_capacity(records.len());
    for record in records {
        let image_url = state
            .storage
            .presigned_url(&record.storage_key)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        data.push(GeneratedImageResponse {
            id: record.id,
            view_type: record.view_type(),
            view_set_id: record.view_set_id,
            prompt: record.prompt,
            image_url,
            created_at: record.created_at,
        });
    }
    Ok(Json(data))
}

/// DELETE /projects/{id}/images/{image_id} — object-store delete is
/// best-effort, matching reference-image removal.
pub async fn remove(
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let record = queries::get_generated_image(&state.db, project_id, image_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "image {} not found in project {}",
                image_id, project_id
            ))
        })?;

    if let Err(e) = state.storage.delete(&record.storage_key).await {
        tracing::warn!(
            key = %record.storage_key,
            error = %e,
            "object delete failed, removing record anyway"
        );
    }

    queries::delete_generated_image(&state.db, project_id, image_id).await?;
    tracing::info!(%project_id, image_id = %image_id, "generated image deleted");
    Ok(StatusCode::NO_CONTENT)
}
