use image::RgbImage;

use super::scaled_confidence;
use crate::pipeline::analysis::imaging::{detect_dark_blobs, round2, to_grayscale};
use crate::pipeline::analysis::overlay::{draw_keypoints, encode_png_data_uri, RED};
use crate::pipeline::analysis::params::NoduleParams;
use crate::pipeline::analysis::types::{
    DetectorOutput, Findings, NoduleFindings, NoduleLocation, Visualization,
};
use crate::pipeline::analysis::AnalysisError;

/// Dark blob keypoints within the area band, circled in red.
pub fn detect(image: &RgbImage, params: &NoduleParams) -> Result<DetectorOutput, AnalysisError> {
    let gray = to_grayscale(image);
    let keypoints = detect_dark_blobs(&gray, params.min_area, params.max_area);

    let mut overlay = image.clone();
    draw_keypoints(&mut overlay, &keypoints, RED);

    let count = keypoints.len();
    let average_size = if count == 0 {
        0.0
    } else {
        round2(keypoints.iter().map(|k| k.size).sum::<f64>() / count as f64)
    };

    let findings = NoduleFindings {
        nodules_detected: count > 0,
        number_of_nodules: count,
        average_size,
        confidence: scaled_confidence(
            count as f64,
            params.confidence_per_finding,
            params.max_confidence,
        ),
    };

    let mut visualization =
        Visualization::new(encode_png_data_uri(&overlay)?, image.width(), image.height());
    visualization.nodule_locations = Some(
        keypoints
            .iter()
            .map(|k| NoduleLocation {
                x: k.x as u32,
                y: k.y as u32,
                size: round2(k.size),
            })
            .collect(),
    );

    Ok(DetectorOutput {
        findings: Findings::LungNodule(findings),
        visualization,
    })
}
