//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the eslip pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EslipConfig {
    /// OCR boundary configuration.
    pub ocr: OcrConfig,

    /// Extraction configuration.
    pub extraction: ExtractionConfig,

    /// Validation configuration.
    pub validation: ValidationConfig,
}

impl Default for EslipConfig {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            extraction: ExtractionConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

/// OCR boundary configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// OCR language code.
    pub lang: String,

    /// Use GPU if the backend supports it.
    pub use_gpu: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            lang: "th".to_string(),
            use_gpu: false,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum block confidence for the bank-branch name scan.
    pub bank_name_threshold: f32,

    /// Minimum block confidence for organization reconstruction.
    pub org_block_threshold: f32,

    /// Confidence recorded for the fallback amount scan.
    pub fallback_amount_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            bank_name_threshold: 0.4,
            org_block_threshold: 0.6,
            fallback_amount_confidence: 0.5,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Apply stricter rules (e.g. require honorifics on person names).
    pub strict: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { strict: false }
    }
}

impl EslipConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_json() {
        let config = EslipConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EslipConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ocr.lang, "th");
        assert!(!back.validation.strict);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let config: EslipConfig =
            serde_json::from_str(r#"{"validation": {"strict": true}}"#).unwrap();
        assert!(config.validation.strict);
        assert_eq!(config.extraction.bank_name_threshold, 0.4);
    }
}
