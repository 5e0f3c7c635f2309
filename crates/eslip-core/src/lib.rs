//! Core library for Thai payment-slip OCR extraction.
//!
//! This crate provides:
//! - An OCR backend boundary with fixture and sidecar implementations
//! - A rule catalogue for Thai e-slip fields (amounts, dates, references, names)
//! - Per-rail name resolution (bank transfer, TrueMoney wallet, generic)
//! - Normalization for OCR digit misreads and Buddhist-era dates
//! - Validation rules with a scored issue report

pub mod error;
pub mod models;
pub mod ocr;
pub mod slip;

pub use error::{EslipError, OcrError, Result};
pub use models::{EslipConfig, ExtractionResult, Field, RailType, Source};
pub use ocr::{full_text, FixtureBackend, OcrBackend, SidecarBackend, TextBlock};
pub use slip::{
    ReceiptPipeline, ReceiptValidator, RuleCatalog, Severity, ValidationIssue, ValidationResult,
};
