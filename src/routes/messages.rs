use crate::db::queries;
use crate::error::AppError;
use crate::models::MessageResponse;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    super::require_project(&state, project_id).await?;

    let records = queries::list_messages(&state.db, project_id).await?;
    let data = records
        .into_iter()
        .map(|m| MessageResponse {
            id: m.id,
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        })
        .collect();
    Ok(Json(data))
}
