use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;

use super::SugarError;
use crate::pipeline::report::{ContentPart, ReportGenerator};

/// `imageops::contrast` scales deviation from mid-grey by `((100 + c) / 100)^2`;
/// 41.4 doubles it.
const OCR_CONTRAST_BOOST: f32 = 41.4;

const OCR_PROMPT: &str = "Transcribe every line of text in this laboratory report exactly as printed, \
including test names, values and units. Output only the transcribed text.";

/// Lab report container, decided by the upload's filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Png,
    Jpeg,
}

impl ReportFormat {
    pub fn from_filename(filename: &str) -> Result<Self, SugarError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("png") => Ok(Self::Png),
            Some("jpg") | Some("jpeg") => Ok(Self::Jpeg),
            _ => Err(SugarError::UnsupportedFormat),
        }
    }
}

/// Embedded text of every PDF page, newline-separated.
pub fn pdf_text(bytes: &[u8]) -> Result<String, SugarError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| SugarError::PdfParsing(e.to_string()))?;
    Ok(pages.join("\n"))
}

/// Contrast-boosted PNG of the scanned report.
pub fn prepare_for_ocr(bytes: &[u8]) -> Result<Vec<u8>, SugarError> {
    let decoded = image::load_from_memory(bytes).map_err(SugarError::Image)?;
    let boosted = image::imageops::contrast(&decoded.to_luma8(), OCR_CONTRAST_BOOST);
    let mut buf = Cursor::new(Vec::new());
    boosted
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(SugarError::Image)?;
    Ok(buf.into_inner())
}

/// Transcribe a scanned report with the multimodal generator.
pub fn ocr_text(bytes: &[u8], generator: &dyn ReportGenerator) -> Result<String, SugarError> {
    let png = prepare_for_ocr(bytes)?;
    let parts = [
        ContentPart::Image {
            mime_type: "image/png".into(),
            data: png,
        },
        ContentPart::Text(OCR_PROMPT.into()),
    ];
    Ok(generator.generate(&parts)?)
}

pub fn extract_text(
    format: ReportFormat,
    bytes: &[u8],
    generator: &dyn ReportGenerator,
) -> Result<String, SugarError> {
    match format {
        ReportFormat::Pdf => pdf_text(bytes),
        ReportFormat::Png | ReportFormat::Jpeg => ocr_text(bytes, generator),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::report::MockReportGenerator;
    use image::{GrayImage, Luma};

    /// Single-page PDF with one line of Helvetica text.
    pub(crate) fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    pub(crate) fn png_bytes() -> Vec<u8> {
        let img = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 100 } else { 160 }]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ReportFormat::from_filename("lab.PDF").unwrap(), ReportFormat::Pdf);
        assert_eq!(ReportFormat::from_filename("scan.jpeg").unwrap(), ReportFormat::Jpeg);
        assert_eq!(ReportFormat::from_filename("scan.JPG").unwrap(), ReportFormat::Jpeg);
        assert_eq!(ReportFormat::from_filename("a.b.png").unwrap(), ReportFormat::Png);
        assert!(ReportFormat::from_filename("report.docx").is_err());
        assert!(ReportFormat::from_filename("noextension").is_err());
    }

    #[test]
    fn pdf_text_is_extracted() {
        let pdf = make_test_pdf("Fasting Blood Sugar 98");
        let text = pdf_text(&pdf).unwrap();
        assert!(text.contains("Fasting"), "got: {text}");
    }

    #[test]
    fn invalid_pdf_is_an_error() {
        assert!(matches!(pdf_text(b"not a pdf"), Err(SugarError::PdfParsing(_))));
    }

    #[test]
    fn contrast_boost_spreads_values() {
        let png = prepare_for_ocr(&png_bytes()).unwrap();
        let out = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(out.dimensions(), (20, 10));
        assert!(out.get_pixel(0, 0)[0] < 100);
        assert!(out.get_pixel(15, 0)[0] > 160);
    }

    #[test]
    fn ocr_sends_image_then_prompt() {
        let generator = MockReportGenerator::new("FBS: 130");
        let text = extract_text(ReportFormat::Png, &png_bytes(), &generator).unwrap();
        assert_eq!(text, "FBS: 130");
        let calls = generator.received();
        assert!(matches!(&calls[0][0], ContentPart::Image { mime_type, .. } if mime_type == "image/png"));
        assert!(matches!(&calls[0][1], ContentPart::Text(p) if p.starts_with("Transcribe")));
    }

    #[test]
    fn undecodable_image_is_an_error() {
        let generator = MockReportGenerator::new("unused");
        assert!(matches!(
            extract_text(ReportFormat::Jpeg, b"garbage", &generator),
            Err(SugarError::Image(_))
        ));
        assert!(generator.received().is_empty());
    }
}
