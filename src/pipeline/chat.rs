//! Conversational base-image generation: one user prompt in, one stored
//! image (plus conversation turns) out. The stored prompt carries the
//! conversation context and output boilerplate appended here, which the view
//! pipeline later strips before deriving angles.

use crate::db::queries;
use crate::error::AppError;
use crate::pipeline::{cost, prompt};
use crate::services::{gemini, storage};
use crate::state::AppState;
use uuid::Uuid;

/// How many prior turns are folded into the prompt as context.
const CONTEXT_TURNS: i64 = 6;

pub struct ChatImage {
    pub id: Uuid,
    pub image_url: String,
    pub prompt: String,
    pub text: Option<String>,
}

/// Generates a base image for a project from a conversational prompt,
/// optionally conditioned on one uploaded reference image.
pub async fn generate_from_prompt(
    state: &AppState,
    project_id: Uuid,
    user_prompt: &str,
    reference_image_id: Option<Uuid>,
) -> Result<ChatImage, AppError> {
    if state.config.gemini_api_key.is_empty() {
        return Err(AppError::Upstream("GEMINI_API_KEY is not configured".into()));
    }

    let project = queries::get_project(&state.db, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {} not found", project_id)))?;

    let reference = match reference_image_id {
        Some(id) => {
            let record = queries::get_reference_image(&state.db, project_id, id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "reference image {} not found in project {}",
                        id, project_id
                    ))
                })?;
            let bytes = state
                .storage
                .get(&record.storage_key)
                .await
                .map_err(|e| AppError::Storage(format!("failed to load reference image: {}", e)))?;
            Some((bytes, storage::mime_for_key(&record.storage_key)))
        }
        None => None,
    };

    let history = queries::recent_messages(&state.db, project_id, CONTEXT_TURNS).await?;
    let format = project.image_format();
    let aspect = project.aspect_ratio();
    let stored_prompt = prompt::build_generation_prompt(user_prompt, format, aspect, &history);

    queries::insert_message(&state.db, project_id, "user", user_prompt).await?;

    tracing::info!(%project_id, "generating base image");
    let result = gemini::generate_image(
        &state.config.gemini_api_key,
        &state.config.gemini_model,
        &stored_prompt,
        reference.as_ref().map(|(bytes, mime)| (bytes.as_slice(), *mime)),
        aspect.as_str(),
    )
    .await
    .map_err(|e| AppError::Upstream(e.to_string()))?;

    let image_id = Uuid::new_v4();
    let key = state
        .storage
        .put(result.bytes, image_id, project_id, &result.mime_type)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;
    queries::insert_generated_image(
        &state.db,
        image_id,
        project_id,
        &key,
        &stored_prompt,
        None,
        None,
    )
    .await?;

    if let Some(text) = &result.text {
        queries::insert_message(&state.db, project_id, "model", text).await?;
    }

    // Chat generation bills prompt tokens, text output tokens and one image.
    let totals = queries::add_project_usage(
        &state.db,
        project_id,
        result.prompt_tokens,
        result.output_tokens,
        1,
    )
    .await?;
    let total_cost = cost::calculate_total_cost(
        totals.input_tokens,
        totals.output_tokens,
        totals.images_generated,
    );
    queries::set_project_cost(&state.db, project_id, total_cost).await?;

    let image_url = state
        .storage
        .presigned_url(&key)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    tracing::info!(%project_id, %image_id, input_tokens = result.prompt_tokens, "base image complete");

    Ok(ChatImage {
        id: image_id,
        image_url,
        prompt: stored_prompt,
        text: result.text,
    })
}
