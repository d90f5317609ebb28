use std::sync::Mutex;
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::types::{ContentPart, GeneratedReport, ReportGenerator};
use super::ReportError;

/// Gemini `generateContent` REST client.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.trim_start_matches("models/").to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn call(&self, body: &GenerateRequest<'_>) -> Result<String, ReportError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ReportError::HttpClient(format!(
                        "Generation timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ReportError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = %self.model, "Generator call failed");
            return Err(ReportError::GeneratorService {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ReportError::ResponseParsing(e.to_string()))?;

        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(ReportError::EmptyResponse);
        }
        Ok(text)
    }
}

// ═══════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: serde_json::Value,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Shape requested from the model for report generation.
#[derive(Deserialize)]
struct StructuredReport {
    condition: String,
    report: String,
}

fn report_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "condition": { "type": "STRING" },
            "report": { "type": "STRING" }
        },
        "required": ["condition", "report"]
    })
}

fn to_request_parts(parts: &[ContentPart]) -> Vec<RequestPart> {
    let engine = base64::engine::general_purpose::STANDARD;
    parts
        .iter()
        .map(|part| match part {
            ContentPart::Image { mime_type, data } => RequestPart::Inline {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: engine.encode(data),
                },
            },
            ContentPart::Text(text) => RequestPart::Text { text: text.clone() },
        })
        .collect()
}

/// Parse schema-constrained output; plain text falls back to scraping later.
fn parse_structured(raw: String) -> GeneratedReport {
    match serde_json::from_str::<StructuredReport>(&raw) {
        Ok(structured) if !structured.report.trim().is_empty() => GeneratedReport {
            text: structured.report,
            condition: Some(structured.condition.trim().to_string())
                .filter(|c| !c.is_empty()),
        },
        _ => GeneratedReport {
            text: raw,
            condition: None,
        },
    }
}

impl ReportGenerator for GeminiClient {
    fn generate(&self, parts: &[ContentPart]) -> Result<String, ReportError> {
        self.call(&GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: to_request_parts(parts),
            }],
            generation_config: None,
        })
    }

    fn generate_report(&self, parts: &[ContentPart]) -> Result<GeneratedReport, ReportError> {
        let raw = self.call(&GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: to_request_parts(parts),
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: report_schema(),
            }),
        })?;
        Ok(parse_structured(raw))
    }
}

/// Stand-in when no API key is configured: every call fails.
pub struct UnconfiguredGenerator;

impl ReportGenerator for UnconfiguredGenerator {
    fn generate(&self, _parts: &[ContentPart]) -> Result<String, ReportError> {
        Err(ReportError::GeneratorNotConfigured)
    }
}

/// Mock generator for testing: returns a configurable response and records inputs.
pub struct MockReportGenerator {
    response: String,
    condition: Option<String>,
    received: Mutex<Vec<Vec<ContentPart>>>,
}

impl MockReportGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            condition: None,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Also return `condition` as a structured field.
    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(condition.to_string());
        self
    }

    /// Parts passed to each call so far.
    pub fn received(&self) -> Vec<Vec<ContentPart>> {
        self.received
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, parts: &[ContentPart]) {
        if let Ok(mut calls) = self.received.lock() {
            calls.push(parts.to_vec());
        }
    }
}

impl ReportGenerator for MockReportGenerator {
    fn generate(&self, parts: &[ContentPart]) -> Result<String, ReportError> {
        self.record(parts);
        if self.response.trim().is_empty() {
            return Err(ReportError::EmptyResponse);
        }
        Ok(self.response.clone())
    }

    fn generate_report(&self, parts: &[ContentPart]) -> Result<GeneratedReport, ReportError> {
        let text = self.generate(parts)?;
        Ok(GeneratedReport {
            text,
            condition: self.condition.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_inline_image_then_text() {
        let parts = vec![
            ContentPart::Image {
                mime_type: "image/png".into(),
                data: vec![0x89, 0x50],
            },
            ContentPart::Text("Describe".into()),
        ];
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: to_request_parts(&parts),
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        let wire = &json["contents"][0]["parts"];
        assert_eq!(wire[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(wire[0]["inlineData"]["data"], "iVA=");
        assert_eq!(wire[1]["text"], "Describe");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn structured_request_carries_schema() {
        let body = GenerateRequest {
            contents: vec![],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: report_schema(),
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            json["generationConfig"]["responseSchema"]["required"],
            serde_json::json!(["condition", "report"])
        );
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Condition "},{"text":"Detected: Cyst"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text(), "Condition Detected: Cyst");

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn structured_output_parsed_when_valid() {
        let report = parse_structured(r#"{"condition":" Glioma ","report":"Long text"}"#.into());
        assert_eq!(report.condition.as_deref(), Some("Glioma"));
        assert_eq!(report.text, "Long text");
    }

    #[test]
    fn plain_text_output_kept_for_scraping() {
        let report = parse_structured("Condition Detected: Cyst\nText".into());
        assert!(report.condition.is_none());
        assert_eq!(report.text, "Condition Detected: Cyst\nText");
    }

    #[test]
    fn blank_structured_condition_is_dropped() {
        let report = parse_structured(r#"{"condition":"  ","report":"Text"}"#.into());
        assert!(report.condition.is_none());
    }

    #[test]
    fn mock_records_parts_and_rejects_empty() {
        let mock = MockReportGenerator::new("Report");
        mock.generate(&[ContentPart::Text("p".into())]).unwrap();
        assert_eq!(mock.received().len(), 1);

        let empty = MockReportGenerator::new("  ");
        assert!(matches!(
            empty.generate(&[]),
            Err(ReportError::EmptyResponse)
        ));
    }

    #[test]
    fn unconfigured_generator_fails() {
        assert!(matches!(
            UnconfiguredGenerator.generate_report(&[]),
            Err(ReportError::GeneratorNotConfigured)
        ));
    }

    #[test]
    fn model_prefix_is_normalized() {
        let client = GeminiClient::new(
            "https://example.test/",
            "models/gemini-2.0-flash",
            "key",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
