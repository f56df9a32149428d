use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use moecalc_core::{ConfigOverrides, ModelConfig, Precision};

use crate::dto::PrecisionInfo;
use crate::error::AppError;

const DOWNLOAD_FILENAME: &str = "moe_config.json";

pub async fn defaults() -> Json<ModelConfig> {
    Json(ModelConfig::default())
}

pub async fn precisions() -> Json<Vec<PrecisionInfo>> {
    Json(Precision::all().iter().copied().map(PrecisionInfo::from).collect())
}

/// Body is the raw text of a config file.
pub async fn upload(body: String) -> Result<Json<ModelConfig>, AppError> {
    let config = ModelConfig::from_json(&body)?;
    tracing::debug!("Loaded uploaded config ({} bytes)", body.len());
    Ok(Json(config))
}

pub async fn download(Json(overrides): Json<ConfigOverrides>) -> Result<Response, AppError> {
    let config = ModelConfig::default().with_overrides(&overrides)?;
    let body = config.to_json()?;
    let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
