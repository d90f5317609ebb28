//! `POST /api/v1/analyze/{kind}`: heuristic detectors.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::api::upload::{read_upload, UploadPolicy};
use crate::models::AnalysisType;
use crate::pipeline::analysis::{analyze_image, AnalysisReport, AnalysisResponse};

pub fn policy_for(kind: AnalysisType) -> UploadPolicy {
    match kind {
        AnalysisType::Retinal => UploadPolicy::RETINAL,
        _ => UploadPolicy::ANALYSIS,
    }
}

pub async fn analyze(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
    kind: AnalysisType,
) -> Result<Json<AnalysisReport>, ApiError> {
    let upload = read_upload(multipart, &policy_for(kind)).await?;

    let core = Arc::clone(&ctx.core);
    let response =
        tokio::task::spawn_blocking(move || analyze_image(&upload.bytes, kind, core.detectors()))
            .await?;

    match response {
        AnalysisResponse::Success(report) => Ok(Json(report)),
        AnalysisResponse::Failure(failure) => Err(ApiError::Internal(format!(
            "Analysis failed: {}",
            failure.error
        ))),
    }
}
