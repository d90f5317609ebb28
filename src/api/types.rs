//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::Serialize;

use crate::core_state::CoreState;
use crate::pipeline::report::{Prediction, ReportRecord};

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Router state. Cheap to clone; every handler gets one.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Response bodies
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// `/predict/xray/` returns the report plus the raw classifier output.
#[derive(Debug, Serialize)]
pub struct XrayReportResponse {
    #[serde(flatten)]
    pub record: ReportRecord,
    pub predictions: Vec<Prediction>,
}
