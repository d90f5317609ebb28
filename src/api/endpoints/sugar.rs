//! Blood-sugar lab report routes.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::api::upload::{read_upload, UploadPolicy};
use crate::pipeline::sugar::{analyze_report, SugarAnalysis};

/// `POST /analyze-sugar-report`
pub async fn analyze(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<SugarAnalysis>, ApiError> {
    let upload = read_upload(multipart, &UploadPolicy::LAB_REPORT).await?;

    let core = Arc::clone(&ctx.core);
    let analysis = tokio::task::spawn_blocking(move || -> Result<SugarAnalysis, ApiError> {
        let analysis = analyze_report(&upload.filename, &upload.bytes, core.generator())?;
        core.store.put_sugar_analysis(analysis.clone())?;
        Ok(analysis)
    })
    .await??;

    Ok(Json(analysis))
}

/// `GET /latest-sugar-analysis`
pub async fn latest(State(ctx): State<ApiContext>) -> Result<Json<SugarAnalysis>, ApiError> {
    ctx.core
        .store
        .latest_sugar_analysis()?
        .map(|entry| Json(entry.value))
        .ok_or_else(|| ApiError::NotFound("No analysis available".into()))
}
