use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{error::AppResult, middleware::RunId, models::CampaignReport};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Runs the recommendation email campaign for a template
///
/// Returns the structured report; pipeline errors map to HTTP statuses via `AppError`.
pub async fn run_campaign(
    State(state): State<AppState>,
    run_id: Option<Extension<RunId>>,
    Path(template_id): Path<String>,
) -> AppResult<Json<CampaignReport>> {
    let run_id = run_id.map(|Extension(id)| id).unwrap_or_default();

    tracing::info!(run_id = %run_id, template_id = %template_id, "Campaign requested");

    let report = state.campaign.run_with_id(run_id.0, &template_id).await?;
    Ok(Json(report))
}
