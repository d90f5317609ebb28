use std::path::Path;
use std::time::Instant;

use super::condition::{condition_marker, extract_condition};
use super::prompt::build_prompt;
use super::symptoms::symptoms_for;
use super::types::{
    ContentPart, InferenceRequest, ModalityInference, ReportGenerator, ReportOutcome,
    ReportRecord,
};
use super::ReportError;
use crate::models::{ReportSlot, ScanMode};

/// Device hint forwarded to the classifiers.
pub const INFERENCE_DEVICE: &str = "cpu";

/// One upload headed for a report slot.
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub slot: ReportSlot,
    /// Spooled upload handed to the classifier.
    pub path: &'a Path,
    /// Declared MIME type of the upload; only `image/*` is attached to the prompt.
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// Infer → symptoms → prompt → generate → condition.
pub struct ReportPipeline<'a> {
    inference: &'a dyn ModalityInference,
    generator: &'a dyn ReportGenerator,
    top_k: usize,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(
        inference: &'a dyn ModalityInference,
        generator: &'a dyn ReportGenerator,
        top_k: usize,
    ) -> Self {
        Self {
            inference,
            generator,
            top_k,
        }
    }

    pub fn run(&self, request: &ReportRequest<'_>) -> Result<ReportOutcome, ReportError> {
        let start = Instant::now();
        let slot = request.slot;
        let scan_mode = slot.scan_mode();

        let output = self.inference.infer(&InferenceRequest {
            path: request.path,
            modality: slot.modality(),
            scan_mode,
            device: INFERENCE_DEVICE,
        })?;
        if output.predictions.is_empty() {
            return Err(ReportError::NoPredictions);
        }

        let symptoms = symptoms_for(&output.predictions, scan_mode, self.top_k);
        let prompt = build_prompt(slot, &symptoms);

        let mut parts = Vec::new();
        match scan_mode {
            ScanMode::Volumetric => {
                parts.extend(output.previews.iter().map(|p| ContentPart::Image {
                    mime_type: p.mime_type.clone(),
                    data: p.data.clone(),
                }));
            }
            ScanMode::Planar => {
                if let Some(mime) = request.content_type.filter(|m| m.starts_with("image/")) {
                    parts.push(ContentPart::Image {
                        mime_type: mime.to_string(),
                        data: request.bytes.to_vec(),
                    });
                }
            }
        }
        let image_parts = parts.len();
        parts.push(ContentPart::Text(prompt));

        let generated = self.generator.generate_report(&parts)?;
        if generated.text.trim().is_empty() {
            return Err(ReportError::EmptyResponse);
        }

        let disease = generated
            .condition
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| extract_condition(&generated.text, condition_marker(slot)));

        tracing::info!(
            slot = %slot,
            symptoms = symptoms.len(),
            image_parts,
            disease = %disease,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Report generated"
        );

        Ok(ReportOutcome {
            record: ReportRecord {
                symptoms,
                disease,
                report: generated.text,
            },
            predictions: output.predictions,
        })
    }
}
