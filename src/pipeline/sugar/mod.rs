//! M3: Blood-sugar lab report analysis.
//!
//! PDF text layer or vision OCR → regex value extraction → threshold
//! assessment with plain-language advice.

pub mod assess;
pub mod extract;
pub mod text;

pub use assess::{assess, SugarAnalysis};
pub use extract::{extract_values, SugarValues};
pub use text::ReportFormat;

use thiserror::Error;

use crate::pipeline::report::{ReportError, ReportGenerator};

#[derive(Error, Debug)]
pub enum SugarError {
    #[error("Unsupported file format. Please upload a PDF or image file.")]
    UnsupportedFormat,

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Cannot read report image: {0}")]
    Image(#[source] image::ImageError),

    #[error("Text recognition failed: {0}")]
    Ocr(#[from] ReportError),
}

impl SugarError {
    /// Rejected before any processing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat)
    }
}

/// Full pipeline for one uploaded report.
pub fn analyze_report(
    filename: &str,
    bytes: &[u8],
    generator: &dyn ReportGenerator,
) -> Result<SugarAnalysis, SugarError> {
    let format = ReportFormat::from_filename(filename)?;
    let text = text::extract_text(format, bytes, generator)?;
    let values = extract_values(&text);
    tracing::info!(
        ?format,
        chars = text.len(),
        fasting = values.fasting.is_some(),
        post_prandial = values.post_prandial.is_some(),
        hba1c = values.hba1c.is_some(),
        "Lab report parsed"
    );
    Ok(assess(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SugarStatus;
    use crate::pipeline::report::MockReportGenerator;

    #[test]
    fn pdf_report_end_to_end() {
        let pdf = text::tests::make_test_pdf("Fasting Blood Sugar: 130 mg/dL");
        let generator = MockReportGenerator::new("unused");
        let analysis = analyze_report("lab.pdf", &pdf, &generator).unwrap();
        assert_eq!(analysis.fasting, Some(130.0));
        assert_eq!(analysis.status, SugarStatus::High);
        assert!(generator.received().is_empty());
    }

    #[test]
    fn image_report_end_to_end() {
        let generator = MockReportGenerator::new("HbA1c: 5.9 %\nPPBS: 120");
        let analysis = analyze_report("scan.jpg", &text::tests::png_bytes(), &generator).unwrap();
        assert_eq!(analysis.hba1c, Some(5.9));
        assert_eq!(analysis.post_prandial, Some(120.0));
        assert_eq!(analysis.status, SugarStatus::BorderlineHigh);
    }

    #[test]
    fn unsupported_extension_is_client_error() {
        let generator = MockReportGenerator::new("unused");
        let err = analyze_report("notes.txt", b"FBS 100", &generator).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Unsupported file format. Please upload a PDF or image file."
        );
    }

    #[test]
    fn generator_failure_is_server_error() {
        let generator = MockReportGenerator::new("");
        let err = analyze_report("scan.png", &text::tests::png_bytes(), &generator).unwrap_err();
        assert!(!err.is_client_error());
        assert!(matches!(err, SugarError::Ocr(ReportError::EmptyResponse)));
    }
}
