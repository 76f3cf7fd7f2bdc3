use crate::db::queries::{self, ReferenceImageRecord};
use crate::error::AppError;
use crate::models::{ColorDescription, ReferenceImageResponse, UpdateReferenceImageRequest};
use crate::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

async fn reference_response(
    state: &AppState,
    record: ReferenceImageRecord,
) -> Result<ReferenceImageResponse, AppError> {
    let image_url = state
        .storage
        .presigned_url(&record.storage_key)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;
    Ok(ReferenceImageResponse {
        id: record.id,
        name: record.name,
        color_descriptions: record.color_descriptions.map(|json| json.0),
        image_url,
        created_at: record.created_at,
    })
}

/// POST /projects/{id}/reference-images — multipart upload with an optional
/// name and optional per-color annotations (JSON array in a text field).
pub async fn upload(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReferenceImageResponse>), AppError> {
    super::require_project(&state, project_id).await?;

    let mut file: Option<(Vec<u8>, String)> = None;
    let mut name: Option<String> = None;
    let mut color_descriptions: Option<Vec<ColorDescription>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read file: {}", e)))?;
                file = Some((bytes.to_vec(), mime_type));
            }
            "name" => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("failed to read name: {}", e)))?,
                );
            }
            "colorDescriptions" => {
                let raw = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("failed to read colorDescriptions: {}", e))
                })?;
                color_descriptions = Some(serde_json::from_str(&raw).map_err(|e| {
                    AppError::BadRequest(format!("invalid colorDescriptions: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (bytes, mime_type) =
        file.ok_or_else(|| AppError::BadRequest("missing file field".into()))?;
    if !mime_type.starts_with("image/") {
        return Err(AppError::BadRequest(format!(
            "unsupported content type {}",
            mime_type
        )));
    }

    let id = Uuid::new_v4();
    let key = state
        .storage
        .put(bytes, id, project_id, &mime_type)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;
    queries::insert_reference_image(
        &state.db,
        id,
        project_id,
        &key,
        name.as_deref(),
        color_descriptions.as_deref(),
    )
    .await?;

    let record = queries::get_reference_image(&state.db, project_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("reference image {} not found", id)))?;

    tracing::info!(%project_id, reference_image_id = %id, "reference image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(reference_response(&state, record).await?),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ReferenceImageResponse>>, AppError> {
    super::require_project(&state, project_id).await?;

    let records = queries::list_reference_images(&state.db, project_id).await?;
    let mut data = Vec::with_capacity(records.len());
    for record in records {
        data.push(reference_response(&state, record).await?);
    }
    Ok(Json(data))
}

/// PATCH /projects/{id}/reference-images/{image_id} — rename and/or replace
/// the per-color annotations. Absent fields are left unchanged.
pub async fn update(
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateReferenceImageRequest>,
) -> Result<Json<ReferenceImageResponse>, AppError> {
    let updated = queries::update_reference_image(
        &state.db,
        project_id,
        image_id,
        req.name.as_deref(),
        req.color_descriptions.as_deref(),
    )
    .await?;
    if updated == 0 {
        return Err(AppError::NotFound(format!(
            "reference image {} not found in project {}",
            image_id, project_id
        )));
    }

    let record = queries::get_reference_image(&state.db, project_id, image_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("reference image {} not found", image_id))
        })?;
    Ok(Json(reference_response(&state, record).await?))
}

/// DELETE /projects/{id}/reference-images/{image_id} — the object-store
/// delete is best-effort; the record is removed either way.
pub async fn remove(
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let record = queries::get_reference_image(&state.db, project_id, image_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "reference image {} not found in project {}",
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

    queries::delete_reference_image(&state.db, project_id, image_id).await?;
    tracing::info!(%project_id, reference_image_id = %image_id, "reference image deleted");
    Ok(StatusCode::NO_CONTENT)
}
