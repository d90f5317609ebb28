use image::RgbImage;

use super::scaled_confidence;
use crate::pipeline::analysis::imaging::{
    contours_in_range, otsu_binarize, percentage, round2, to_grayscale, ContourRegion,
};
use crate::pipeline::analysis::overlay::{draw_contours, encode_png_data_uri, GREEN};
use crate::pipeline::analysis::params::TumorParams;
use crate::pipeline::analysis::types::{
    DetectorOutput, Findings, TumorFindings, Visualization,
};
use crate::pipeline::analysis::AnalysisError;

/// Otsu foreground → contour borders in the area band, traced in green.
pub fn detect(image: &RgbImage, params: &TumorParams) -> Result<DetectorOutput, AnalysisError> {
    let gray = to_grayscale(image);
    let binary = otsu_binarize(&gray);
    let regions = contours_in_range(&binary, params.min_area, params.max_area);

    let mut overlay = image.clone();
    draw_contours(&mut overlay, &regions, GREEN, 2);

    let count = regions.len();
    let total = image.width() as f64 * image.height() as f64;
    let tumor_area: f64 = regions.iter().map(|r| r.area).sum();

    let findings = TumorFindings {
        tumor_detected: count > 0,
        number_of_tumors: count,
        tumor_area_percentage: round2(percentage(tumor_area, total)),
        confidence: scaled_confidence(
            count as f64,
            params.confidence_per_finding,
            params.max_confidence,
        ),
    };

    let mut visualization =
        Visualization::new(encode_png_data_uri(&overlay)?, image.width(), image.height());
    visualization.tumor_regions = Some(
        regions
            .iter()
            .filter_map(ContourRegion::bounding_box)
            .collect(),
    );

    Ok(DetectorOutput {
        findings: Findings::BrainTumor(findings),
        visualization,
    })
}
