//! Data models for slip extraction.

pub mod config;
pub mod receipt;

pub use config::EslipConfig;
pub use receipt::{ExtractionResult, Field, RailType, Source};
