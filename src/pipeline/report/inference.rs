use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::types::{InferenceOutput, InferenceRequest, ModalityInference, Prediction, PreviewImage};
use super::ReportError;
use crate::models::{Modality, ScanMode};

/// Client for the model-serving process that hosts the per-modality classifiers.
///
/// `POST {base_url}/v1/infer` with the scan base64-encoded in a JSON body.
pub struct HttpModelClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpModelClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

#[derive(Serialize)]
struct InferRequestBody<'a> {
    modality: Modality,
    mode: ScanMode,
    device: &'a str,
    filename: Option<&'a str>,
    data: String,
}

#[derive(Deserialize)]
struct InferResponseBody {
    predictions: Vec<Prediction>,
    #[serde(default)]
    previews: Vec<PreviewBody>,
}

#[derive(Deserialize)]
struct PreviewBody {
    view: String,
    #[serde(default = "default_preview_mime")]
    mime_type: String,
    data: String,
}

fn default_preview_mime() -> String {
    "image/png".into()
}

impl ModalityInference for HttpModelClient {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<InferenceOutput, ReportError> {
        let bytes = std::fs::read(request.path)?;
        let engine = base64::engine::general_purpose::STANDARD;
        let body = InferRequestBody {
            modality: request.modality,
            mode: request.scan_mode,
            device: request.device,
            filename: request.path.file_name().and_then(|n| n.to_str()),
            data: engine.encode(&bytes),
        };

        let url = format!("{}/v1/infer", self.base_url);
        tracing::debug!(
            modality = %request.modality,
            mode = %request.scan_mode,
            bytes = bytes.len(),
            "Calling inference service"
        );

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                ReportError::InferenceConnection(self.base_url.clone())
            } else if e.is_timeout() {
                ReportError::HttpClient(format!("Inference timed out after {}s", self.timeout_secs))
            } else {
                ReportError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReportError::InferenceService {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: InferResponseBody = response
            .json()
            .map_err(|e| ReportError::ResponseParsing(e.to_string()))?;

        let previews = parsed
            .previews
            .into_iter()
            .map(|p| {
                let data = engine
                    .decode(p.data.as_bytes())
                    .map_err(|e| ReportError::ResponseParsing(format!("preview {}: {e}", p.view)))?;
                Ok(PreviewImage {
                    view: p.view,
                    mime_type: p.mime_type,
                    data,
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        validate_predictions(parsed.predictions).map(|predictions| InferenceOutput {
            predictions,
            previews,
        })
    }
}

/// Reject empty output and probabilities outside [0, 1].
pub fn validate_predictions(predictions: Vec<Prediction>) -> Result<Vec<Prediction>, ReportError> {
    if predictions.is_empty() {
        return Err(ReportError::NoPredictions);
    }
    if let Some(bad) = predictions
        .iter()
        .find(|p| !(0.0..=1.0).contains(&p.probability))
    {
        return Err(ReportError::InvalidPrediction {
            label: bad.label.clone(),
            probability: bad.probability,
        });
    }
    Ok(predictions)
}

/// Fixed-output classifier for tests and offline runs.
pub struct StaticInference {
    predictions: Vec<Prediction>,
    previews: Vec<PreviewImage>,
}

impl StaticInference {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            predictions: pairs.iter().map(|(l, p)| Prediction::new(*l, *p)).collect(),
            previews: Vec::new(),
        }
    }

    pub fn with_previews(mut self, previews: Vec<PreviewImage>) -> Self {
        self.previews = previews;
        self
    }
}

impl ModalityInference for StaticInference {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<InferenceOutput, ReportError> {
        if !request.path.exists() {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is gone", request.path.display()),
            )));
        }
        let previews = match request.scan_mode {
            ScanMode::Volumetric => self.previews.clone(),
            ScanMode::Planar => Vec::new(),
        };
        Ok(InferenceOutput {
            predictions: validate_predictions(self.predictions.clone())?,
            previews,
        })
    }
}
