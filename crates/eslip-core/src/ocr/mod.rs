//! OCR backend boundary.
//!
//! The recognition engine itself is an external collaborator; this module
//! defines the contract the pipeline consumes: an ordered list of recognized
//! text blocks with per-block confidence. Backend selection is a
//! constructor-time choice of the pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OcrError;

/// One OCR-recognized text span with its engine-reported confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Join blocks into the full document text, reading order preserved.
pub fn full_text(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contract for OCR backends.
///
/// A backend that finds no text must return an empty list, not an error.
pub trait OcrBackend {
    /// Recognize text blocks in the image at `path`, in reading order.
    fn recognize(&self, path: &Path) -> Result<Vec<TextBlock>, OcrError>;

    /// Optional preprocessed copy of the image for a fallback retry when the
    /// first pass finds nothing. The caller owns the returned file and must
    /// delete it regardless of outcome.
    fn preprocessed_copy(&self, _path: &Path) -> Option<PathBuf> {
        None
    }
}

/// Backend serving canned blocks.
///
/// This is the injection point for tests and demos; it replaces any
/// special-casing of document identity inside the pipeline.
#[derive(Debug, Clone, Default)]
pub struct FixtureBackend {
    blocks: Vec<TextBlock>,
}

impl FixtureBackend {
    /// Backend that recognizes the given blocks for every image.
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self { blocks }
    }

    /// Backend that recognizes nothing, like an engine pointed at a blank image.
    pub fn empty() -> Self {
        Self { blocks: Vec::new() }
    }
}

impl OcrBackend for FixtureBackend {
    fn recognize(&self, path: &Path) -> Result<Vec<TextBlock>, OcrError> {
        if !path.exists() {
            return Err(OcrError::ImageNotFound(path.to_path_buf()));
        }
        Ok(self.blocks.clone())
    }
}

/// Backend reading pre-recognized blocks from a `<image>.ocr.json` sidecar.
///
/// The sidecar is a JSON array of `{"text": ..., "confidence": ...}` objects
/// in reading order, as produced by an out-of-process recognition engine.
#[derive(Debug, Clone, Default)]
pub struct SidecarBackend;

impl SidecarBackend {
    pub fn new() -> Self {
        Self
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_os_string();
        os.push(".ocr.json");
        PathBuf::from(os)
    }
}

impl OcrBackend for SidecarBackend {
    fn recognize(&self, path: &Path) -> Result<Vec<TextBlock>, OcrError> {
        if !path.exists() {
            return Err(OcrError::ImageNotFound(path.to_path_buf()));
        }

        let sidecar = Self::sidecar_path(path);
        if !sidecar.exists() {
            return Err(OcrError::BackendUnavailable(format!(
                "no recognition sidecar at {}",
                sidecar.display()
            )));
        }

        let content = std::fs::read_to_string(&sidecar)
            .map_err(|e| OcrError::Backend(e.to_string()))?;
        let blocks: Vec<TextBlock> =
            serde_json::from_str(&content).map_err(|e| OcrError::Backend(e.to_string()))?;

        debug!("Read {} blocks from {}", blocks.len(), sidecar.display());
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fixture_backend_fails_fast_on_missing_image() {
        let backend = FixtureBackend::new(vec![TextBlock::new("x", 0.9)]);
        let err = backend
            .recognize(Path::new("/nonexistent/receipt.jpg"))
            .unwrap_err();
        assert!(matches!(err, OcrError::ImageNotFound(_)));
    }

    #[test]
    fn sidecar_backend_reads_blocks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("slip.jpg");
        std::fs::write(&image, b"not really an image").unwrap();
        std::fs::write(
            dir.path().join("slip.jpg.ocr.json"),
            r#"[{"text": "นาย สมชาย", "confidence": 0.9}, {"text": "100.00 บาท", "confidence": 0.8}]"#,
        )
        .unwrap();

        let blocks = SidecarBackend::new().recognize(&image).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "นาย สมชาย");
        assert_eq!(full_text(&blocks), "นาย สมชาย\n100.00 บาท");
    }

    #[test]
    fn sidecar_backend_is_unavailable_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("slip.jpg");
        std::fs::write(&image, b"img").unwrap();

        let err = SidecarBackend::new().recognize(&image).unwrap_err();
        assert!(matches!(err, OcrError::BackendUnavailable(_)));
    }
}
