//! M2: Inference-to-report pipeline.
//!
//! Upload → modality classifier → top-k symptom labels → prompt template →
//! multimodal generator → condition extraction.

pub mod condition;
pub mod gemini;
pub mod inference;
pub mod orchestrator;
pub mod prompt;
pub mod symptoms;
pub mod types;

pub use condition::{condition_marker, extract_condition, UNKNOWN_CONDITION};
pub use gemini::{GeminiClient, MockReportGenerator, UnconfiguredGenerator};
pub use inference::{HttpModelClient, StaticInference};
pub use orchestrator::{ReportPipeline, ReportRequest, INFERENCE_DEVICE};
pub use prompt::{build_prompt, template_for};
pub use symptoms::{extract_top_symptoms, symptoms_for};
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot connect to inference service at {0}")]
    InferenceConnection(String),

    #[error("Inference service error ({status}): {body}")]
    InferenceService { status: u16, body: String },

    #[error("Inference returned no predictions")]
    NoPredictions,

    #[error("Invalid prediction for {label}: probability {probability}")]
    InvalidPrediction { label: String, probability: f64 },

    #[error("Generative model is not configured (set GEMINI_API_KEY)")]
    GeneratorNotConfigured,

    #[error("Generative model error ({status}): {body}")]
    GeneratorService { status: u16, body: String },

    #[error("Empty response from generative model.")]
    EmptyResponse,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing failed: {0}")]
    ResponseParsing(String),

    #[error("Cannot read upload: {0}")]
    Io(#[from] std::io::Error),
}
