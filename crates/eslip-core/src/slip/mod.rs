//! Slip field extraction module.

pub mod catalog;
pub mod fields;
pub mod names;
pub mod normalize;
mod pipeline;
pub mod validate;

pub use catalog::{BrandRule, FieldRule, RuleCatalog};
pub use fields::{extract_field, FieldExtraction};
pub use names::{NameResolver, ResolvedNames};
pub use pipeline::ReceiptPipeline;
pub use validate::{ReceiptValidator, Severity, ValidationIssue, ValidationResult};
