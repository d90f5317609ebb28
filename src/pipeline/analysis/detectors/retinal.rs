use image::RgbImage;

use super::scaled_confidence;
use crate::pipeline::analysis::imaging::{count_nonzero, hsv_mask, percentage, round2};
use crate::pipeline::analysis::overlay::{encode_png_data_uri, paint_mask, RED};
use crate::pipeline::analysis::params::RetinalParams;
use crate::pipeline::analysis::types::{
    DetectorOutput, Findings, RetinalFindings, Visualization,
};
use crate::pipeline::analysis::AnalysisError;

/// Red-band pixels as a share of the fundus image; masked pixels painted red.
pub fn detect(image: &RgbImage, params: &RetinalParams) -> Result<DetectorOutput, AnalysisError> {
    let mask = hsv_mask(image, params.hsv_lower, params.hsv_upper);
    let total = image.width() as f64 * image.height() as f64;
    let red_percentage = percentage(count_nonzero(&mask) as f64, total);

    let mut overlay = image.clone();
    paint_mask(&mut overlay, &mask, RED);

    let findings = RetinalFindings {
        abnormalities_detected: red_percentage > params.abnormal_percentage,
        hemorrhage_percentage: round2(red_percentage),
        confidence: scaled_confidence(
            red_percentage,
            params.confidence_multiplier,
            params.max_confidence,
        ),
    };

    Ok(DetectorOutput {
        findings: Findings::Retinal(findings),
        visualization: Visualization::new(
            encode_png_data_uri(&overlay)?,
            image.width(),
            image.height(),
        ),
    })
}
