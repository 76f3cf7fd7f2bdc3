use crate::db::queries::{self, ProjectRecord};
use crate::error::AppError;
use crate::models::{CreateProjectRequest, ProjectResponse, ProjectSummaryResponse};
use crate::pipeline::cost;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

fn project_response(record: ProjectRecord) -> ProjectResponse {
    let image_format = record.image_format();
    let aspect_ratio = record.aspect_ratio();
    ProjectResponse {
        id: record.id,
        name: record.name,
        image_format,
        aspect_ratio,
        input_tokens: record.input_tokens,
        output_tokens: record.output_tokens,
        images_generated: record.images_generated,
        total_cost_usd: record.total_cost_usd,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("project name must not be empty".into()));
    }

    let record = queries::insert_project(
        &state.db,
        Uuid::new_v4(),
        name,
        req.image_format.unwrap_or_default(),
        req.aspect_ratio.unwrap_or_default(),
    )
    .await?;

    tracing::info!(project_id = %record.id, "project created");
    Ok((StatusCode::CREATED, Json(project_response(record))))
}

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectSummaryResponse>>, AppError> {
    let projects = queries::list_projects(&state.db).await?;

    let data = projects
        .into_iter()
        .map(|p| {
            let display_tokens = p.project.input_tokens
                + p.project.output_tokens
                + cost::image_token_equivalent(p.project.images_generated);
            ProjectSummaryResponse {
                project: project_response(p.project),
                image_count: p.image_count,
                reference_image_count: p.reference_image_count,
                message_count: p.message_count,
                display_tokens,
            }
        })
        .collect();

    Ok(Json(data))
}

#[derive(Debug, serde::Deserialize)]
pub struct DeleteProjectQuery {
    pub id: Uuid,
}

pub async fn delete_project(
    State(state): State<AppState>,
    Query(query): Query<DeleteProjectQuery>,
) -> Result<StatusCode, AppError> {
    super::require_project(&state, query.id).await?;

    // Best-effort object cleanup; the row cascade proceeds regardless.
    let keys = queries::project_storage_keys(&state.db, query.id).await?;
    for key in &keys {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "object delete failed during project removal");
        }
    }

    queries::delete_project(&state.db, query.id).await?;
    tracing::info!(project_id = %query.id, objects = keys.len(), "project deleted");
    Ok(StatusCode::NO_CONTENT)
}
