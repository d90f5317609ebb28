//! HTTP router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Each route group carries its own body limit (file ceiling plus multipart
//! headroom). The whole router sits behind permissive CORS and request tracing.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints::{analysis, health, predict, reports, sugar};
use crate::api::types::ApiContext;
use crate::config::{
    MAX_IMAGE_UPLOAD_BYTES, MAX_RETINAL_UPLOAD_BYTES, MAX_VOLUME_UPLOAD_BYTES,
    MULTIPART_OVERHEAD_BYTES,
};
use crate::core_state::CoreState;
use crate::models::{AnalysisType, ReportSlot};

/// Build the application router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn body_limit(file_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(file_bytes + MULTIPART_OVERHEAD_BYTES)
}

fn analysis_routes() -> Router<ApiContext> {
    let mut router = Router::new();
    for &kind in AnalysisType::ALL {
        let limit = match kind {
            AnalysisType::Retinal => MAX_RETINAL_UPLOAD_BYTES,
            _ => MAX_IMAGE_UPLOAD_BYTES,
        };
        let route = Router::new()
            .route(
                &format!("/analyze/{}", kind.route_slug()),
                post(move |state: State<ApiContext>, multipart: Multipart| {
                    analysis::analyze(state, multipart, kind)
                }),
            )
            .layer(body_limit(limit));
        router = router.merge(route);
    }
    router
}

/// POST runs the pipeline for `slot`, GET returns its latest record.
fn slot_route(path: &str, slot: ReportSlot) -> Router<ApiContext> {
    Router::new().route(
        path,
        post(move |state: State<ApiContext>, multipart: Multipart| {
            predict::slot_report(state, multipart, slot)
        })
        .get(move |state: State<ApiContext>| predict::latest_slot(state, slot)),
    )
}

fn planar_report_routes() -> Router<ApiContext> {
    Router::new()
        .route("/predict/xray/", post(predict::xray))
        .merge(slot_route("/predict/ultrasound/", ReportSlot::Ultrasound))
        .merge(slot_route("/predict/ct/2d/", ReportSlot::Ct2d))
        .route("/generate-report/:modality/", post(reports::generate))
        .route("/analyze-sugar-report", post(sugar::analyze))
        .layer(body_limit(MAX_IMAGE_UPLOAD_BYTES))
}

fn volumetric_report_routes() -> Router<ApiContext> {
    Router::new()
        .merge(slot_route("/predict/ct/3d/", ReportSlot::Ct3d))
        .merge(slot_route("/predict/mri/3d/", ReportSlot::Mri3d))
        .layer(body_limit(MAX_VOLUME_UPLOAD_BYTES))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let polling = Router::new()
        .route("/health", get(health::check))
        .route("/get_latest_results/", get(predict::latest_xray))
        .route("/get-latest-report/:slot/", get(reports::latest))
        .route("/latest-sugar-analysis", get(sugar::latest));

    Router::new()
        .nest("/api/v1", analysis_routes())
        .merge(planar_report_routes())
        .merge(volumetric_report_routes())
        .merge(polling)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
