//! Dedicated per-modality routes under `/predict/`.

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::endpoints::reports::{policy_for, run_report};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, XrayReportResponse};
use crate::api::upload::read_upload;
use crate::models::ReportSlot;
use crate::pipeline::report::ReportRecord;
use crate::store::XrayPredictions;

/// `POST /predict/xray/`: report plus raw predictions.
pub async fn xray(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<XrayReportResponse>, ApiError> {
    let slot = ReportSlot::Xray;
    let upload = read_upload(multipart, &policy_for(slot)).await?;
    let outcome = run_report(&ctx, slot, upload).await?;
    Ok(Json(XrayReportResponse {
        record: outcome.record,
        predictions: outcome.predictions,
    }))
}

/// `GET /get_latest_results/`
pub async fn latest_xray(State(ctx): State<ApiContext>) -> Result<Json<XrayPredictions>, ApiError> {
    ctx.core
        .store
        .latest_xray_predictions()?
        .map(|entry| Json(entry.value))
        .ok_or_else(|| ApiError::NotFound("No prediction results available yet.".into()))
}

pub async fn slot_report(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
    slot: ReportSlot,
) -> Result<Json<ReportRecord>, ApiError> {
    let upload = read_upload(multipart, &policy_for(slot)).await?;
    let outcome = run_report(&ctx, slot, upload).await?;
    Ok(Json(outcome.record))
}

pub async fn latest_slot(
    State(ctx): State<ApiContext>,
    slot: ReportSlot,
) -> Result<Json<ReportRecord>, ApiError> {
    ctx.core
        .store
        .latest_report(slot)?
        .map(|entry| Json(entry.value))
        .ok_or_else(|| ApiError::NotFound(format!("No {} report available.", slot_label(slot))))
}

fn slot_label(slot: ReportSlot) -> &'static str {
    match slot {
        ReportSlot::Xray => "X-ray",
        ReportSlot::Ct => "CT",
        ReportSlot::Ultrasound => "ultrasound",
        ReportSlot::Mri => "MRI",
        ReportSlot::Ct2d => "2D CT",
        ReportSlot::Ct3d => "3D CT",
        ReportSlot::Mri3d => "3D MRI",
    }
}
