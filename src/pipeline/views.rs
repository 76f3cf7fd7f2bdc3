//! Derives a four-angle view set (front/side/top/bottom) from a base image.
//!
//! The four generation calls run strictly sequentially against the image
//! model, reusing the base image bytes fetched once. Views that fail are
//! skipped and recorded; the batch errors only when every view fails.

use crate::db::queries;
use crate::error::AppError;
use crate::models::ViewType;
use crate::pipeline::{cost, prompt};
use crate::services::{gemini, storage};
use crate::state::AppState;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct GeneratedView {
    pub id: Uuid,
    pub view_type: ViewType,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct SkippedView {
    pub view_type: ViewType,
    pub reason: String,
}

/// Result of one per-view attempt.
pub enum ViewOutcome {
    Generated(GeneratedView),
    Skipped(SkippedView),
}

pub struct ViewSetResult {
    pub view_set_id: Uuid,
    pub views: Vec<GeneratedView>,
    pub skipped: Vec<SkippedView>,
}

impl ViewSetResult {
    /// Partitions per-view outcomes into successes and skips, preserving
    /// generation order. Zero successes is a hard upstream failure: the
    /// caller has nothing to show and nothing was billed.
    fn from_outcomes(view_set_id: Uuid, outcomes: Vec<ViewOutcome>) -> Result<Self, AppError> {
        let total = outcomes.len();
        let mut views = Vec::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match outcome {
                ViewOutcome::Generated(view) => views.push(view),
                ViewOutcome::Skipped(skip) => skipped.push(skip),
            }
        }

        if views.is_empty() {
            return Err(AppError::Upstream(format!(
                "all {} view generations failed",
                total
            )));
        }

        Ok(ViewSetResult {
            view_set_id,
            views,
            skipped,
        })
    }
}

/// Generates up to four view images for a project from a base image.
///
/// When `base_image_id` is absent, the project's most recent base image is
/// used. Fails only when the project or base image cannot be resolved, the
/// base bytes cannot be loaded, or every view attempt fails.
pub async fn generate_view_set(
    state: &AppState,
    project_id: Uuid,
    base_image_id: Option<Uuid>,
) -> Result<ViewSetResult, AppError> {
    if state.config.gemini_api_key.is_empty() {
        return Err(AppError::Upstream("GEMINI_API_KEY is not configured".into()));
    }

    let project = queries::get_project(&state.db, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {} not found", project_id)))?;

    let base = match base_image_id {
        Some(id) => queries::get_base_image(&state.db, project_id, id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "base image {} not found in project {}",
                    id, project_id
                ))
            })?,
        None => queries::latest_base_image(&state.db, project_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "project {} has no base image to derive views from",
                    project_id
                ))
            })?,
    };

    // Fetched once, reused by all four calls.
    let base_bytes = state
        .storage
        .get(&base.storage_key)
        .await
        .map_err(|e| AppError::Storage(format!("failed to load base image: {}", e)))?;
    let base_mime = storage::mime_for_key(&base.storage_key);

    let format = project.image_format();
    let aspect = project.aspect_ratio();
    let view_set_id = Uuid::new_v4();
    let mut input_tokens: i64 = 0;
    let mut outcomes = Vec::with_capacity(ViewType::ALL.len());

    for view in ViewType::ALL {
        let view_prompt = prompt::build_view_prompt(&base.prompt, format, aspect, view);
        tracing::info!(%project_id, view = view.as_str(), "generating view");

        let attempt = async {
            let result = gemini::generate_image(
                &state.config.gemini_api_key,
                &state.config.gemini_model,
                &view_prompt,
                Some((&base_bytes, base_mime)),
                aspect.as_str(),
            )
            .await?;

            let image_id = Uuid::new_v4();
            let key = state
                .storage
                .put(result.bytes, image_id, project_id, &result.mime_type)
                .await?;
            queries::insert_generated_image(
                &state.db,
                image_id,
                project_id,
                &key,
                &view_prompt,
                Some(view),
                Some(view_set_id),
            )
            .await?;
            let image_url = state.storage.presigned_url(&key).await?;

            anyhow::Ok((
                GeneratedView {
                    id: image_id,
                    view_type: view,
                    image_url,
                },
                result.prompt_tokens,
            ))
        };

        match attempt.await {
            Ok((generated, prompt_tokens)) => {
                input_tokens += prompt_tokens;
                outcomes.push(ViewOutcome::Generated(generated));
            }
            Err(e) => {
                tracing::warn!(%project_id, view = view.as_str(), error = %e, "view skipped");
                outcomes.push(ViewOutcome::Skipped(SkippedView {
                    view_type: view,
                    reason: e.to_string(),
                }));
            }
        }
    }

    let result = ViewSetResult::from_outcomes(view_set_id, outcomes)?;

    // Bill the batch: prompt tokens plus one image per succeeded view.
    // Image generation has no output-token component.
    let totals = queries::add_project_usage(
        &state.db,
        project_id,
        input_tokens,
        0,
        result.views.len() as i64,
    )
    .await?;
    let total_cost = cost::calculate_total_cost(
        totals.input_tokens,
        totals.output_tokens,
        totals.images_generated,
    );
    queries::set_project_cost(&state.db, project_id, total_cost).await?;

    tracing::info!(
        %project_id,
        view_set_id = %result.view_set_id,
        generated = result.views.len(),
        skipped = result.skipped.len(),
        input_tokens,
        "view set complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(view_type: ViewType, view_set_id: Uuid) -> ViewOutcome {
        ViewOutcome::Generated(GeneratedView {
            id: Uuid::new_v4(),
            view_type,
            image_url: format!("https://store.test/{}/{}", view_set_id, view_type),
        })
    }

    fn skipped(view_type: ViewType) -> ViewOutcome {
        ViewOutcome::Skipped(SkippedView {
            view_type,
            reason: "No candidates in Gemini response".into(),
        })
    }

    #[test]
    fn partial_failure_keeps_the_successful_views() {
        let view_set_id = Uuid::new_v4();
        let outcomes = vec![
            generated(ViewType::Front, view_set_id),
            skipped(ViewType::Side),
            generated(ViewType::Top, view_set_id),
            generated(ViewType::Bottom, view_set_id),
        ];

        let result = ViewSetResult::from_outcomes(view_set_id, outcomes).unwrap();
        assert_eq!(result.view_set_id, view_set_id);
        assert_eq!(result.views.len(), 3);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].view_type, ViewType::Side);

        // Generation order is preserved in the result.
        let order: Vec<ViewType> = result.views.iter().map(|v| v.view_type).collect();
        assert_eq!(order, [ViewType::Front, ViewType::Top, ViewType::Bottom]);
    }

    #[test]
    fn all_failed_is_a_hard_upstream_error() {
        let view_set_id = Uuid::new_v4();
        let outcomes = ViewType::ALL.map(skipped).into_iter().collect();

        match ViewSetResult::from_outcomes(view_set_id, outcomes) {
            Err(AppError::Upstream(msg)) => assert!(msg.contains("all 4")),
            other => panic!("expected upstream error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn all_succeeded_has_no_skips() {
        let view_set_id = Uuid::new_v4();
        let outcomes = ViewType::ALL
            .map(|v| generated(v, view_set_id))
            .into_iter()
            .collect();

        let result = ViewSetResult::from_outcomes(view_set_id, outcomes).unwrap();
        assert_eq!(result.views.len(), 4);
        assert!(result.skipped.is_empty());
    }
}
