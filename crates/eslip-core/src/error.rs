//! Error types for the eslip-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the eslip library.
#[derive(Error, Debug)]
pub enum EslipError {
    /// OCR boundary error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors at the OCR backend boundary.
///
/// A backend that finds no text in an image returns an empty block list,
/// never an error. These variants cover the cases where the pipeline cannot
/// even attempt recognition.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Input image file does not exist.
    #[error("image file not found: {0}")]
    ImageNotFound(PathBuf),

    /// No OCR backend could be resolved at initialization.
    #[error("no OCR backend available: {0}")]
    BackendUnavailable(String),

    /// The backend failed while recognizing an image.
    #[error("OCR backend failed: {0}")]
    Backend(String),
}

/// Result type for the eslip library.
pub type Result<T> = std::result::Result<T, EslipError>;
