use image::RgbImage;
use imageproc::edges::canny;

use super::scaled_confidence;
use crate::pipeline::analysis::imaging::{count_nonzero, percentage, round2, to_grayscale};
use crate::pipeline::analysis::overlay::{blend_edges, encode_png_data_uri};
use crate::pipeline::analysis::params::OrganParams;
use crate::pipeline::analysis::types::{DetectorOutput, Findings, OrganFindings, Visualization};
use crate::pipeline::analysis::AnalysisError;

/// Edge density as an abnormality score; overlay is the image blended with its edge map.
pub fn detect(image: &RgbImage, params: &OrganParams) -> Result<DetectorOutput, AnalysisError> {
    let gray = to_grayscale(image);
    let edges = canny(&gray, params.canny_low, params.canny_high);
    let total = image.width() as f64 * image.height() as f64;
    let edge_percentage = percentage(count_nonzero(&edges) as f64, total);

    let overlay = blend_edges(image, &edges, params.image_weight);

    let findings = OrganFindings {
        abnormalities_detected: edge_percentage > params.abnormal_percentage,
        abnormality_score: round2(edge_percentage),
        confidence: scaled_confidence(
            edge_percentage,
            params.confidence_multiplier,
            params.max_confidence,
        ),
    };

    Ok(DetectorOutput {
        findings: Findings::Organ(findings),
        visualization: Visualization::new(
            encode_png_data_uri(&overlay)?,
            image.width(),
            image.height(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::overlay::decode_data_uri;
    use image::Rgb;

    fn findings(output: &DetectorOutput) -> &OrganFindings {
        match &output.findings {
            Findings::Organ(f) => f,
            other => panic!("unexpected findings: {other:?}"),
        }
    }

    #[test]
    fn flat_image_scores_zero() {
        let img = RgbImage::from_pixel(80, 60, Rgb([90, 90, 90]));
        let output = detect(&img, &OrganParams::default()).unwrap();
        let f = findings(&output);
        assert!(!f.abnormalities_detected);
        assert_eq!(f.abnormality_score, 0.0);
        assert_eq!(f.confidence, 0.0);

        let overlay = decode_data_uri(&output.visualization.overlay);
        assert_eq!(overlay.dimensions(), (80, 60));
        // 90 * 0.7
        assert_eq!(*overlay.get_pixel(10, 10), Rgb([63, 63, 63]));
    }

    #[test]
    fn striped_image_has_edges() {
        let img = RgbImage::from_fn(100, 100, |x, _| {
            if (x / 4) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let output = detect(&img, &OrganParams::default()).unwrap();
        let f = findings(&output);
        assert!(f.abnormality_score > 0.0);
        assert_eq!(f.abnormalities_detected, f.abnormality_score > 10.0);
        assert!(f.confidence <= 95.0);
    }
}
