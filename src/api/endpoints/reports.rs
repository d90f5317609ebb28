//! Report generation routes and the shared upload → report → store flow.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::api::upload::{read_upload, Upload, UploadPolicy};
use crate::models::{Modality, ReportSlot, ScanMode};
use crate::pipeline::report::{ReportOutcome, ReportRecord, ReportRequest};

pub fn policy_for(slot: ReportSlot) -> UploadPolicy {
    match slot.scan_mode() {
        ScanMode::Planar => UploadPolicy::REPORT_IMAGE,
        ScanMode::Volumetric => UploadPolicy::VOLUME,
    }
}

/// Spool the upload, run the report pipeline, keep the record as the slot's latest.
///
/// X-ray results also replace the polled prediction map, in the same write.
pub(crate) async fn run_report(
    ctx: &ApiContext,
    slot: ReportSlot,
    upload: Upload,
) -> Result<ReportOutcome, ApiError> {
    let core = Arc::clone(&ctx.core);
    let span = tracing::info_span!("report", run_id = %Uuid::new_v4(), slot = %slot);
    tokio::task::spawn_blocking(move || -> Result<ReportOutcome, ApiError> {
        let _guard = span.enter();
        // Dropped at the end of this closure on every path.
        let spooled = upload.spool()?;
        let outcome = core.report_pipeline().run(&ReportRequest {
            slot,
            path: spooled.path(),
            content_type: upload.content_type.as_deref(),
            bytes: &upload.bytes,
        })?;
        match slot {
            ReportSlot::Xray => core
                .store
                .put_xray_result(outcome.record.clone(), &outcome.predictions)?,
            _ => core.store.put_report(slot, outcome.record.clone())?,
        };
        Ok(outcome)
    })
    .await?
}

/// `POST /generate-report/{modality}/`
pub async fn generate(
    State(ctx): State<ApiContext>,
    Path(modality): Path<String>,
    multipart: Multipart,
) -> Result<Json<ReportRecord>, ApiError> {
    let modality: Modality = modality
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid modality.".into()))?;
    let slot = ReportSlot::from(modality);

    let upload = read_upload(multipart, &policy_for(slot)).await?;
    let outcome = run_report(&ctx, slot, upload).await?;
    Ok(Json(outcome.record))
}

/// `GET /get-latest-report/{slot}/`
pub async fn latest(
    State(ctx): State<ApiContext>,
    Path(slot): Path<String>,
) -> Result<Json<ReportRecord>, ApiError> {
    let not_found = || ApiError::NotFound("No report available for this modality.".into());
    let slot: ReportSlot = slot.to_ascii_lowercase().parse().map_err(|_| not_found())?;
    ctx.core
        .store
        .latest_report(slot)?
        .map(|entry| Json(entry.value))
        .ok_or_else(not_found)
}
