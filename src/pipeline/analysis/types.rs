use serde::Serialize;

use crate::models::AnalysisType;

// ═══════════════════════════════════════════════════════════
// Geometry
// ═══════════════════════════════════════════════════════════

/// Axis-aligned pixel rectangle, inclusive of both edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Detected blob centre with its equivalent-circle diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoduleLocation {
    pub x: u32,
    pub y: u32,
    pub size: f64,
}

// ═══════════════════════════════════════════════════════════
// Findings
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FractureFindings {
    pub fracture_detected: bool,
    pub number_of_fractures: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoduleFindings {
    pub nodules_detected: bool,
    pub number_of_nodules: usize,
    pub average_size: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TumorFindings {
    pub tumor_detected: bool,
    pub number_of_tumors: usize,
    pub tumor_area_percentage: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetinalFindings {
    pub abnormalities_detected: bool,
    pub hemorrhage_percentage: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganFindings {
    pub abnormalities_detected: bool,
    pub abnormality_score: f64,
    pub confidence: f64,
}

/// Detector-specific findings. Serialized without a tag: the enclosing
/// report's `analysis_type` already says which shape to expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Findings {
    Fracture(FractureFindings),
    LungNodule(NoduleFindings),
    BrainTumor(TumorFindings),
    Retinal(RetinalFindings),
    Organ(OrganFindings),
}

impl Findings {
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Fracture(f) => f.confidence,
            Self::LungNodule(f) => f.confidence,
            Self::BrainTumor(f) => f.confidence,
            Self::Retinal(f) => f.confidence,
            Self::Organ(f) => f.confidence,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Visualization + responses
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visualization {
    /// `data:image/png;base64,...`, same dimensions as the input.
    pub overlay: String,
    /// `[height, width]` of the decoded input.
    pub original_size: [u32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_boxes: Option<Vec<BoundingBox>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodule_locations: Option<Vec<NoduleLocation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tumor_regions: Option<Vec<BoundingBox>>,
}

impl Visualization {
    pub fn new(overlay: String, width: u32, height: u32) -> Self {
        Self {
            overlay,
            original_size: [height, width],
            bounding_boxes: None,
            nodule_locations: None,
            tumor_regions: None,
        }
    }
}

/// Output of a single detector.
#[derive(Debug, Clone)]
pub struct DetectorOutput {
    pub findings: Findings,
    pub visualization: Visualization,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub status: &'static str,
    pub analysis_type: AnalysisType,
    pub findings: Findings,
    pub visualization: Visualization,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub error: String,
    pub status: &'static str,
}

/// Dispatcher result: `{status:"success", ...}` or `{error, status:"error"}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Success(AnalysisReport),
    Failure(AnalysisFailure),
}

impl AnalysisResponse {
    pub fn success(analysis_type: AnalysisType, output: DetectorOutput) -> Self {
        Self::Success(AnalysisReport {
            status: "success",
            analysis_type,
            findings: output.findings,
            visualization: output.visualization,
        })
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(AnalysisFailure {
            error: error.into(),
            status: "error",
        })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success(r) => r.status,
            Self::Failure(f) => f.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_flat() {
        let json = serde_json::to_value(AnalysisResponse::failure("bad bytes")).unwrap();
        assert_eq!(json["error"], "bad bytes");
        assert_eq!(json["status"], "error");
    }

    #[test]
    fn visualization_omits_absent_geometry() {
        let json = serde_json::to_value(Visualization::new("data:".into(), 640, 480)).unwrap();
        assert_eq!(json["original_size"], serde_json::json!([480, 640]));
        assert!(json.get("bounding_boxes").is_none());
        assert!(json.get("nodule_locations").is_none());
    }

    #[test]
    fn success_carries_tag_and_findings() {
        let output = DetectorOutput {
            findings: Findings::Organ(OrganFindings {
                abnormalities_detected: false,
                abnormality_score: 1.5,
                confidence: 1.5,
            }),
            visualization: Visualization::new("data:".into(), 2, 2),
        };
        let json = serde_json::to_value(AnalysisResponse::success(AnalysisType::Organ, output)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["analysis_type"], "organ");
        assert_eq!(json["findings"]["abnormality_score"], 1.5);
    }
}
