use image::RgbImage;
use imageproc::edges::canny;

use super::scaled_confidence;
use crate::pipeline::analysis::imaging::{contours_in_range, to_grayscale, ContourRegion};
use crate::pipeline::analysis::overlay::{draw_contours, encode_png_data_uri, RED};
use crate::pipeline::analysis::params::FractureParams;
use crate::pipeline::analysis::types::{
    DetectorOutput, Findings, FractureFindings, Visualization,
};
use crate::pipeline::analysis::AnalysisError;

/// Edge map → all contour borders → area band. Each surviving contour is
/// reported as a candidate fracture line and traced in red.
pub fn detect(image: &RgbImage, params: &FractureParams) -> Result<DetectorOutput, AnalysisError> {
    let gray = to_grayscale(image);
    let edges = canny(&gray, params.canny_low, params.canny_high);
    let regions = contours_in_range(&edges, params.min_area, params.max_area);

    let mut overlay = image.clone();
    draw_contours(&mut overlay, &regions, RED, 2);

    let count = regions.len();
    let findings = FractureFindings {
        fracture_detected: count > 0,
        number_of_fractures: count,
        confidence: scaled_confidence(
            count as f64,
            params.confidence_per_finding,
            params.max_confidence,
        ),
    };

    let mut visualization =
        Visualization::new(encode_png_data_uri(&overlay)?, image.width(), image.height());
    visualization.bounding_boxes = Some(
        regions
            .iter()
            .filter_map(ContourRegion::bounding_box)
            .collect(),
    );

    Ok(DetectorOutput {
        findings: Findings::Fracture(findings),
        visualization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::overlay::decode_data_uri;
    use image::Rgb;
    use imageproc::drawing::draw_filled_circle_mut;

    fn findings(output: &DetectorOutput) -> &FractureFindings {
        match &output.findings {
            Findings::Fracture(f) => f,
            other => panic!("unexpected findings: {other:?}"),
        }
    }

    #[test]
    fn blank_image_has_no_fractures() {
        let img = RgbImage::from_pixel(64, 48, Rgb([0, 0, 0]));
        let output = detect(&img, &FractureParams::default()).unwrap();
        let f = findings(&output);
        assert!(!f.fracture_detected);
        assert_eq!(f.number_of_fractures, 0);
        assert_eq!(f.confidence, 0.0);
        assert_eq!(output.visualization.bounding_boxes, Some(vec![]));
        assert_eq!(output.visualization.original_size, [48, 64]);
    }

    #[test]
    fn bright_disc_yields_candidates() {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
        draw_filled_circle_mut(&mut img, (100, 100), 25, Rgb([255, 255, 255]));

        let params = FractureParams::default();
        let output = detect(&img, &params).unwrap();
        let f = findings(&output);
        assert!(f.fracture_detected);
        assert!(f.number_of_fractures >= 1);
        assert_eq!(
            f.confidence,
            (f.number_of_fractures as f64 * 20.0).min(99.0)
        );
        let boxes = output.visualization.bounding_boxes.as_ref().unwrap();
        assert_eq!(boxes.len(), f.number_of_fractures);
    }

    #[test]
    fn overlay_matches_input_dimensions() {
        let mut img = RgbImage::from_pixel(120, 80, Rgb([10, 10, 10]));
        draw_filled_circle_mut(&mut img, (60, 40), 20, Rgb([240, 240, 240]));
        let output = detect(&img, &FractureParams::default()).unwrap();
        let overlay = decode_data_uri(&output.visualization.overlay);
        assert_eq!(overlay.dimensions(), (120, 80));
    }
}
