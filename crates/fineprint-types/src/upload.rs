//! Upload set classification.
//!
//! The analysis service accepts either exactly one PDF or a homogeneous
//! batch of photos. Anything else is rejected before a byte leaves the
//! client.

use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";
pub const IMAGE_MIMES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/heic"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// A single PDF document.
    Document,
    /// One or more photos the service will assemble into a document.
    PhotoSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("no files were provided")]
    Empty,
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("upload either a single PDF or a set of photos (JPG/PNG)")]
    MixedBatch,
}

fn is_image(mime: &str) -> bool {
    IMAGE_MIMES.contains(&mime)
}

/// Classify a staged upload by MIME type.
pub fn classify_upload(mimes: &[&str]) -> Result<UploadKind, UploadError> {
    if mimes.is_empty() {
        return Err(UploadError::Empty);
    }

    if let Some(unknown) = mimes.iter().find(|m| **m != PDF_MIME && !is_image(m)) {
        return Err(UploadError::Unsupported((*unknown).to_string()));
    }

    if mimes.iter().all(|m| is_image(m)) {
        return Ok(UploadKind::PhotoSet);
    }

    // At least one PDF from here on: valid only as a lone document.
    if mimes.len() == 1 {
        Ok(UploadKind::Document)
    } else {
        Err(UploadError::MixedBatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pdf_is_document() {
        assert_eq!(classify_upload(&[PDF_MIME]), Ok(UploadKind::Document));
    }

    #[test]
    fn test_image_batch_is_photo_set() {
        assert_eq!(
            classify_upload(&["image/jpeg", "image/png", "image/heic"]),
            Ok(UploadKind::PhotoSet)
        );
        assert_eq!(classify_upload(&["image/png"]), Ok(UploadKind::PhotoSet));
    }

    #[test]
    fn test_empty_set_rejected() {
        assert_eq!(classify_upload(&[]), Err(UploadError::Empty));
    }

    #[test]
    fn test_mixed_pdf_and_images_rejected() {
        assert_eq!(
            classify_upload(&[PDF_MIME, "image/jpeg"]),
            Err(UploadError::MixedBatch)
        );
    }

    #[test]
    fn test_multiple_pdfs_rejected() {
        assert_eq!(
            classify_upload(&[PDF_MIME, PDF_MIME]),
            Err(UploadError::MixedBatch)
        );
    }

    #[test]
    fn test_unknown_type_rejected_by_name() {
        assert_eq!(
            classify_upload(&["application/zip"]),
            Err(UploadError::Unsupported("application/zip".to_string()))
        );
        // An unknown type is reported even when PDFs are present.
        assert_eq!(
            classify_upload(&[PDF_MIME, "text/plain"]),
            Err(UploadError::Unsupported("text/plain".to_string()))
        );
    }
}
