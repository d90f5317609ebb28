//! Multipart upload intake.
//!
//! Every upload route reads the single `file` field, checks its declared
//! MIME type before touching the payload, then checks the size. Routes that
//! hand the file to a classifier spool it to a named temp file that is
//! removed when the handle drops.

use std::io::Write;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use tempfile::NamedTempFile;

use crate::api::error::ApiError;
use crate::config::{MAX_IMAGE_UPLOAD_BYTES, MAX_RETINAL_UPLOAD_BYTES, MAX_VOLUME_UPLOAD_BYTES};

const FILE_FIELD: &str = "file";

pub const ANALYSIS_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/bmp",
    "image/dicom",
    "application/dicom",
    "application/octet-stream",
];

pub const RETINAL_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/bmp",
    "application/octet-stream",
];

pub const REPORT_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/bmp"];

/// What a route accepts.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    /// `None` accepts any declared type.
    pub allowed_types: Option<&'static [&'static str]>,
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub const ANALYSIS: Self = Self {
        allowed_types: Some(ANALYSIS_TYPES),
        max_bytes: MAX_IMAGE_UPLOAD_BYTES,
    };
    pub const RETINAL: Self = Self {
        allowed_types: Some(RETINAL_TYPES),
        max_bytes: MAX_RETINAL_UPLOAD_BYTES,
    };
    pub const REPORT_IMAGE: Self = Self {
        allowed_types: Some(REPORT_IMAGE_TYPES),
        max_bytes: MAX_IMAGE_UPLOAD_BYTES,
    };
    pub const VOLUME: Self = Self {
        allowed_types: None,
        max_bytes: MAX_VOLUME_UPLOAD_BYTES,
    };
    /// Lab reports are checked by extension further down.
    pub const LAB_REPORT: Self = Self {
        allowed_types: None,
        max_bytes: MAX_IMAGE_UPLOAD_BYTES,
    };

    pub fn too_large(&self) -> ApiError {
        ApiError::BadRequest(format!(
            "File too large. Maximum size is {}MB.",
            self.max_bytes / (1024 * 1024)
        ))
    }

    fn check_type(&self, content_type: Option<&str>) -> Result<(), ApiError> {
        let Some(allowed) = self.allowed_types else {
            return Ok(());
        };
        match content_type {
            Some(ct) if allowed.contains(&ct) => Ok(()),
            other => Err(ApiError::BadRequest(format!(
                "Unsupported file type: {}. Supported types: {}",
                other.unwrap_or("unknown"),
                allowed.join(", ")
            ))),
        }
    }
}

/// A validated upload held in memory.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// Write the payload to a temp file that keeps the original extension(s).
    pub fn spool(&self) -> Result<NamedTempFile, ApiError> {
        let mut file = tempfile::Builder::new()
            .prefix("medivision-")
            .suffix(&upload_suffix(&self.filename))
            .tempfile()
            .map_err(|e| ApiError::Internal(format!("Cannot create temp file: {e}")))?;
        file.write_all(&self.bytes)
            .and_then(|_| file.flush())
            .map_err(|e| ApiError::Internal(format!("Cannot write temp file: {e}")))?;
        Ok(file)
    }
}

/// Pull the `file` field out of a multipart body and validate it.
pub async fn read_upload(mut multipart: Multipart, policy: &UploadPolicy) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, policy))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        policy.check_type(content_type.as_deref())?;

        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, policy))?;
        if bytes.len() > policy.max_bytes {
            return Err(policy.too_large());
        }

        tracing::debug!(
            filename = %filename,
            content_type = content_type.as_deref().unwrap_or("-"),
            size = bytes.len(),
            "Upload accepted"
        );
        return Ok(Upload {
            filename,
            content_type,
            bytes,
        });
    }
    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

/// Body-limit rejections surface here as 413; report them as the same 400 the size check gives.
fn multipart_error(err: MultipartError, policy: &UploadPolicy) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        policy.too_large()
    } else {
        ApiError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    }
}

/// `.nii.gz`-style compound extensions survive; anything unsafe is dropped.
fn upload_suffix(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    match name.find('.') {
        Some(idx) if idx + 1 < name.len() => {
            let ext = &name[idx..];
            if ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
                ext.to_ascii_lowercase()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_keeps_compound_extension() {
        assert_eq!(upload_suffix("brain.nii.gz"), ".nii.gz");
        assert_eq!(upload_suffix("Chest.PNG"), ".png");
        assert_eq!(upload_suffix("../../etc/passwd"), "");
        assert_eq!(upload_suffix("noext"), "");
        assert_eq!(upload_suffix("bad.p$g"), "");
    }

    #[test]
    fn type_check_lists_supported_types() {
        let err = UploadPolicy::ANALYSIS.check_type(Some("text/plain")).unwrap_err();
        match err {
            ApiError::BadRequest(msg) => {
                assert!(msg.starts_with("Unsupported file type: text/plain."));
                assert!(msg.contains("image/jpeg, image/png"));
                assert!(msg.contains("application/dicom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn retinal_rejects_dicom() {
        assert!(UploadPolicy::RETINAL.check_type(Some("application/dicom")).is_err());
        assert!(UploadPolicy::RETINAL.check_type(Some("image/png")).is_ok());
    }

    #[test]
    fn missing_type_rejected_only_when_restricted() {
        assert!(UploadPolicy::REPORT_IMAGE.check_type(None).is_err());
        assert!(UploadPolicy::VOLUME.check_type(None).is_ok());
    }

    #[test]
    fn too_large_message_names_limit() {
        match UploadPolicy::RETINAL.too_large() {
            ApiError::BadRequest(msg) => assert_eq!(msg, "File too large. Maximum size is 20MB."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn spooled_file_is_removed_on_drop() {
        let upload = Upload {
            filename: "scan.png".into(),
            content_type: Some("image/png".into()),
            bytes: Bytes::from_static(b"pixels"),
        };
        let file = upload.spool().unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"pixels");
        assert!(path.to_string_lossy().ends_with(".png"));
        drop(file);
        assert!(!path.exists());
    }
}
