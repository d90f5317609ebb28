//! M1: Heuristic image analysis.
//!
//! Decodes an uploaded image, routes it to the detector for the requested
//! analysis type, and returns findings plus an annotated overlay. Failures
//! never escape as panics or `Err`: the dispatcher folds them into an
//! `{error, status:"error"}` response.

pub mod detectors;
pub mod imaging;
pub mod overlay;
pub mod params;
pub mod types;

pub use params::*;
pub use types::*;

use std::panic::{catch_unwind, AssertUnwindSafe};

use image::RgbImage;
use thiserror::Error;

use crate::models::AnalysisType;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Empty image payload")]
    EmptyInput,

    #[error("Cannot decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Decoded image has zero width or height")]
    EmptyImage,

    #[error("Overlay encoding failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Detector failed: {0}")]
    DetectorPanic(String),
}

/// Decode any format the `image` crate recognizes into 8-bit RGB.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let image = image::load_from_memory(bytes)
        .map_err(AnalysisError::Decode)?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalysisError::EmptyImage);
    }
    Ok(image)
}

/// Run the detector for `analysis_type` on raw image bytes.
pub fn analyze_image(
    bytes: &[u8],
    analysis_type: AnalysisType,
    config: &DetectorConfig,
) -> AnalysisResponse {
    let outcome = catch_unwind(AssertUnwindSafe(|| run_detector(bytes, analysis_type, config)))
        .unwrap_or_else(|payload| Err(AnalysisError::DetectorPanic(panic_message(payload))));

    match outcome {
        Ok(output) => {
            tracing::info!(
                analysis_type = %analysis_type,
                confidence = output.findings.confidence(),
                "Image analysis complete"
            );
            AnalysisResponse::success(analysis_type, output)
        }
        Err(e) => {
            tracing::warn!(analysis_type = %analysis_type, error = %e, "Image analysis failed");
            AnalysisResponse::failure(e.to_string())
        }
    }
}

fn run_detector(
    bytes: &[u8],
    analysis_type: AnalysisType,
    config: &DetectorConfig,
) -> Result<DetectorOutput, AnalysisError> {
    let image = decode_rgb(bytes)?;
    tracing::debug!(
        analysis_type = %analysis_type,
        width = image.width(),
        height = image.height(),
        "Decoded image"
    );

    match analysis_type {
        AnalysisType::Fracture => detectors::fracture::detect(&image, &config.fracture),
        AnalysisType::LungNodule => detectors::lung_nodule::detect(&image, &config.lung_nodule),
        AnalysisType::BrainTumor => detectors::brain_tumor::detect(&image, &config.brain_tumor),
        AnalysisType::Retinal => detectors::retinal::detect(&image, &config.retinal),
        AnalysisType::Organ => detectors::organ::detect(&image, &config.organ),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
