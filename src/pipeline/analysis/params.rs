//! Tunable detector parameters.
//!
//! The thresholds are hand-picked screening constants, not calibrated
//! values. Every field can be overridden from a JSON file pointed to by
//! `MEDIVISION_DETECTOR_CONFIG`; omitted fields keep the defaults below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectorConfig {
    pub fracture: FractureParams,
    pub lung_nodule: NoduleParams,
    pub brain_tumor: TumorParams,
    pub retinal: RetinalParams,
    pub organ: OrganParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractureParams {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Exclusive lower contour-area bound, in square pixels.
    pub min_area: f64,
    /// Exclusive upper contour-area bound, in square pixels.
    pub max_area: f64,
    pub confidence_per_finding: f64,
    pub max_confidence: f64,
}

impl Default for FractureParams {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            min_area: 100.0,
            max_area: 5000.0,
            confidence_per_finding: 20.0,
            max_confidence: 99.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoduleParams {
    /// Inclusive blob-area bounds, in square pixels.
    pub min_area: f64,
    pub max_area: f64,
    pub confidence_per_finding: f64,
    pub max_confidence: f64,
}

impl Default for NoduleParams {
    fn default() -> Self {
        Self {
            min_area: 10.0,
            max_area: 1000.0,
            confidence_per_finding: 15.0,
            max_confidence: 95.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TumorParams {
    /// Exclusive contour-area bounds, in square pixels.
    pub min_area: f64,
    pub max_area: f64,
    pub confidence_per_finding: f64,
    pub max_confidence: f64,
}

impl Default for TumorParams {
    fn default() -> Self {
        Self {
            min_area: 50.0,
            max_area: 10000.0,
            confidence_per_finding: 20.0,
            max_confidence: 95.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetinalParams {
    /// Inclusive HSV band on the 8-bit scale (H in 0..180, S and V in 0..=255).
    pub hsv_lower: [u8; 3],
    pub hsv_upper: [u8; 3],
    /// Masked-pixel percentage above which the image is flagged.
    pub abnormal_percentage: f64,
    pub confidence_multiplier: f64,
    pub max_confidence: f64,
}

impl Default for RetinalParams {
    fn default() -> Self {
        Self {
            hsv_lower: [0, 100, 100],
            hsv_upper: [10, 255, 255],
            abnormal_percentage: 0.1,
            confidence_multiplier: 5.0,
            max_confidence: 95.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganParams {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Edge-pixel percentage above which the image is flagged.
    pub abnormal_percentage: f64,
    pub confidence_multiplier: f64,
    pub max_confidence: f64,
    /// Weight of the source image in the overlay blend; the edge map gets the rest.
    pub image_weight: f32,
}

impl Default for OrganParams {
    fn default() -> Self {
        Self {
            canny_low: 100.0,
            canny_high: 200.0,
            abnormal_percentage: 10.0,
            confidence_multiplier: 1.0,
            max_confidence: 95.0,
            image_weight: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"retinal": {"abnormal_percentage": 0.5}}"#).unwrap();
        assert_eq!(config.retinal.abnormal_percentage, 0.5);
        assert_eq!(config.retinal.hsv_upper, [10, 255, 255]);
        assert_eq!(config.fracture, FractureParams::default());
    }

    #[test]
    fn confidence_ceilings_stay_within_99() {
        let config = DetectorConfig::default();
        for ceiling in [
            config.fracture.max_confidence,
            config.lung_nodule.max_confidence,
            config.brain_tumor.max_confidence,
            config.retinal.max_confidence,
            config.organ.max_confidence,
        ] {
            assert!(ceiling <= 99.0);
        }
    }
}
