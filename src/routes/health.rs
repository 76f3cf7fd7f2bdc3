use crate::db::queries;
use crate::error::AppError;
use crate::models::HealthResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

static START_TIME: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

pub fn init_start_time() {
    START_TIME.get_or_init(std::time::Instant::now);
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, AppError> {
    let total_cost = queries::total_cost(&state.db).await.unwrap_or(0.0);

    let uptime = START_TIME
        .get()
        .map(|t| t.elapsed().as_secs())
        .unwrap_or(0);

    Ok(Json(HealthResponse {
        status: "ok".into(),
        total_cost_usd: total_cost,
        uptime_seconds: uptime,
    }))
}
