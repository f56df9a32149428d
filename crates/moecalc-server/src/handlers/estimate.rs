use std::sync::Arc;

use axum::{extract::State, Json};
use moecalc_core::{Estimator, ModelConfig};
use tracing::info;

use crate::dto::{EstimateRequest, EstimateResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn estimate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let config = ModelConfig::default().with_overrides(&req.config)?;
    let precision = state.resolve_precision(req.precision.as_deref());

    let report = Estimator::with_precision(config, precision).report();
    info!(
        precision = %precision,
        total_gb = report.metrics.total_gb,
        prefill_tflops = report.metrics.prefill_tflops(),
        "estimate"
    );

    Ok(Json(EstimateResponse::new(config, report)))
}
