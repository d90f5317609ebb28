use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ReportError;
use crate::models::{Modality, ScanMode};

// ═══════════════════════════════════════════════════════════
// Inference
// ═══════════════════════════════════════════════════════════

/// One classifier output: label with probability in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

/// Rendered slice of a volumetric scan (axial, coronal or sagittal).
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub view: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct InferenceRequest<'a> {
    /// Upload spooled to disk; lives until the request finishes.
    pub path: &'a Path,
    pub modality: Modality,
    pub scan_mode: ScanMode,
    pub device: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct InferenceOutput {
    pub predictions: Vec<Prediction>,
    /// Filled only for volumetric scans.
    pub previews: Vec<PreviewImage>,
}

/// Per-modality classifier, hosted outside this process.
pub trait ModalityInference: Send + Sync {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<InferenceOutput, ReportError>;
}

// ═══════════════════════════════════════════════════════════
// Generation
// ═══════════════════════════════════════════════════════════

/// Ordered multimodal input: images first, prompt last.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Image { mime_type: String, data: Vec<u8> },
    Text(String),
}

/// Report text plus the condition, when the model returned it as a field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedReport {
    pub text: String,
    pub condition: Option<String>,
}

/// Hosted multimodal text generator.
pub trait ReportGenerator: Send + Sync {
    /// Free-form text for the given parts. An empty reply is an error.
    fn generate(&self, parts: &[ContentPart]) -> Result<String, ReportError>;

    /// Report generation. Backends with schema-constrained output override
    /// this to return the condition as a separate field.
    fn generate_report(&self, parts: &[ContentPart]) -> Result<GeneratedReport, ReportError> {
        Ok(GeneratedReport {
            text: self.generate(parts)?,
            condition: None,
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Results
// ═══════════════════════════════════════════════════════════

/// What the report routes return and what the store keeps per slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub symptoms: Vec<String>,
    pub disease: String,
    pub report: String,
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub record: ReportRecord,
    /// Raw classifier output, in the order the service returned it.
    pub predictions: Vec<Prediction>,
}
