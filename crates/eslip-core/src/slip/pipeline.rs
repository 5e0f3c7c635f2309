//! End-to-end extraction pipeline: OCR, field extraction, name resolution,
//! confidence aggregation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{EslipConfig, ExtractionResult, Field, RailType, Source};
use crate::ocr::{full_text, OcrBackend, TextBlock};
use crate::slip::catalog::RuleCatalog;
use crate::slip::fields::extract_field;
use crate::slip::names::{reconstruct_receiver, NameResolver};
use crate::slip::normalize::{clean_name, convert_buddhist_year, normalize_amount};

lazy_static! {
    static ref FALLBACK_AMOUNT: Regex = Regex::new(r"(\d{2,3}\.\d{2})").unwrap();
}

/// Per-field weights for the overall confidence score.
const FIELD_WEIGHTS: [(Field, f32); 7] = [
    (Field::Amount, 0.30),
    (Field::Date, 0.25),
    (Field::ReferenceId, 0.15),
    (Field::Merchant, 0.15),
    (Field::SenderName, 0.10),
    (Field::ReceiverName, 0.10),
    (Field::Fee, 0.05),
];

/// Fields granting a bonus when present.
const CRITICAL_FIELDS: [Field; 2] = [Field::Amount, Field::Date];

/// Fields penalized when missing.
const IMPORTANT_FIELDS: [Field; 3] = [Field::Amount, Field::Date, Field::Merchant];

/// Payment-slip extraction pipeline over a pluggable OCR backend.
pub struct ReceiptPipeline<B> {
    backend: B,
    catalog: RuleCatalog,
    config: EslipConfig,
}

impl<B: OcrBackend> ReceiptPipeline<B> {
    /// Pipeline with the built-in Thai rule catalogue and default config.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EslipConfig::default())
    }

    pub fn with_config(backend: B, config: EslipConfig) -> Self {
        Self {
            backend,
            catalog: RuleCatalog::thai(),
            config,
        }
    }

    /// Swap in a different rule catalogue.
    pub fn with_catalog(mut self, catalog: RuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Run OCR on the image and extract all receipt fields.
    ///
    /// A document where OCR finds no text at all is retried once on the
    /// backend's preprocessed copy, then degrades to an empty result rather
    /// than an error. A missing image file is an error.
    pub fn extract(&self, image_path: &Path) -> Result<ExtractionResult> {
        let mut blocks = self.backend.recognize(image_path)?;

        if blocks.is_empty() {
            if let Some(copy) = self.backend.preprocessed_copy(image_path) {
                let copy = TempImage(copy);
                debug!(path = %copy.0.display(), "retrying OCR on preprocessed copy");
                blocks = self.backend.recognize(&copy.0)?;
            }
        }

        if blocks.is_empty() {
            warn!(path = %image_path.display(), "OCR produced no text blocks");
            return Ok(ExtractionResult::default());
        }

        Ok(self.extract_from_blocks(&blocks))
    }

    /// Extract all receipt fields from already-recognized text blocks.
    pub fn extract_from_blocks(&self, blocks: &[TextBlock]) -> ExtractionResult {
        let text = full_text(blocks);
        let mut result = ExtractionResult::default();
        let mut confidences: BTreeMap<Field, f32> = BTreeMap::new();

        if let Some(hit) = self.capture(&text, blocks, Field::Date, &mut confidences) {
            result.date = Some(convert_buddhist_year(&hit));
        }

        let amount_raw = match self.capture(&text, blocks, Field::Amount, &mut confidences) {
            Some(raw) => Some(raw),
            None => {
                let fallback = find_fallback_amount(&text);
                if fallback.is_some() {
                    confidences.insert(
                        Field::Amount,
                        self.config.extraction.fallback_amount_confidence,
                    );
                }
                fallback
            }
        };
        if let Some(raw) = amount_raw {
            result.amount = normalize_amount(&raw);
        }

        if let Some(raw) = self.capture(&text, blocks, Field::Fee, &mut confidences) {
            result.fee = normalize_amount(&raw);
        }

        result.reference_id = self.capture(&text, blocks, Field::ReferenceId, &mut confidences);

        let (merchant, source) = self.detect_merchant_and_source(&text);
        debug!(?source, merchant = merchant.as_deref(), "detected payment source");

        let resolver = match NameResolver::for_source(&source, &self.catalog) {
            NameResolver::Bank(r) => NameResolver::Bank(
                r.with_scan_threshold(self.config.extraction.bank_name_threshold),
            ),
            NameResolver::Generic(r) => NameResolver::Generic(
                r.with_org_threshold(self.config.extraction.org_block_threshold),
            ),
            other => other,
        };
        let names = resolver.resolve(&text, blocks);
        result.sender_name = names.sender;
        result.receiver_name = names.receiver;
        if let Some(confidence) = names.sender_confidence {
            confidences.insert(Field::SenderName, confidence);
        }
        if let Some(confidence) = names.receiver_confidence {
            confidences.insert(Field::ReceiverName, confidence);
        }

        // Bank slips: fall back to organization reconstruction, then to the
        // detected merchant, when the name scan found no receiver.
        if source.brand == "Bank" {
            if result.receiver_name.is_none() {
                result.receiver_name = reconstruct_receiver(
                    &text,
                    blocks,
                    self.config.extraction.org_block_threshold,
                );
            }
            if result.receiver_name.is_none() {
                if let Some(m) = merchant.as_deref() {
                    if m != "Bank" {
                        result.receiver_name = Some(m.to_string());
                    }
                }
            }
        }

        result.sender_name = result.sender_name.as_deref().and_then(clean_name);
        result.receiver_name = result.receiver_name.as_deref().and_then(clean_name);

        // Bank rail rule: a specific merchant wins, otherwise the rail label.
        result.merchant = if source.rail == RailType::Bank {
            match merchant.as_deref() {
                Some(m) if m != "Bank" => Some(m.to_string()),
                _ => Some("Bank".to_string()),
            }
        } else {
            merchant.clone()
        };
        result.source = source.clone();

        // Rail branches resolve names without per-match scoring; give those
        // names their per-rail default confidences.
        match source.brand.as_str() {
            "TrueMoney" => {
                if result.sender_name.is_some() {
                    confidences.entry(Field::SenderName).or_insert(0.7);
                }
                if result.receiver_name.is_some() {
                    confidences.entry(Field::ReceiverName).or_insert(0.7);
                }
            }
            "Bank" => {
                let lower = text.to_lowercase();
                if result.sender_name.is_some() {
                    let confidence = if lower.contains("make") || lower.contains("kbank") {
                        0.8
                    } else {
                        0.6
                    };
                    confidences.entry(Field::SenderName).or_insert(confidence);
                }
                if result.receiver_name.is_some() {
                    let confidence = if result.receiver_name == merchant {
                        0.5
                    } else {
                        0.7
                    };
                    confidences.entry(Field::ReceiverName).or_insert(confidence);
                }
            }
            _ => {}
        }

        if let Some(m) = merchant.as_deref() {
            let confidence = if source.rail == RailType::Bank && m != "Bank" {
                0.8
            } else if m == "Bank" {
                0.9
            } else {
                0.7
            };
            confidences.insert(Field::Merchant, confidence);
        }

        result.field_confidence = confidences;
        result.overall_confidence = overall_confidence(&result);
        result
    }

    fn capture(
        &self,
        text: &str,
        blocks: &[TextBlock],
        field: Field,
        confidences: &mut BTreeMap<Field, f32>,
    ) -> Option<String> {
        // A miss still records its confidence so the wire map carries an
        // explicit zero for every field the rules were run against.
        match extract_field(text, self.catalog.rules_for(field), blocks, field) {
            Some(hit) => {
                confidences.insert(field, hit.confidence);
                Some(hit.value)
            }
            None => {
                confidences.insert(field, 0.0);
                None
            }
        }
    }

    /// Merchant name from the business-name rules, plus rail and brand from
    /// the ordered brand table. A non-bank brand doubles as the merchant
    /// when no business name matched.
    fn detect_merchant_and_source(&self, text: &str) -> (Option<String>, Source) {
        let mut merchant = None;
        for rule in self.catalog.merchant_rules() {
            if let Some(caps) = rule.captures(text) {
                if let Some(group) = caps.get(1) {
                    let candidate = group.as_str().trim();
                    // Bare 5-digit store codes are not business names.
                    if candidate.chars().count() == 5
                        && candidate.chars().all(|c| c.is_numeric())
                    {
                        continue;
                    }
                    merchant = Some(candidate.to_string());
                    break;
                }
            }
        }

        let source = match self.catalog.detect_brand(text) {
            Some(rule) => {
                if merchant.is_none() && rule.rail != RailType::Bank {
                    merchant = Some(rule.brand.clone());
                }
                Source::new(rule.rail, rule.brand.clone())
            }
            None => Source::default(),
        };

        (merchant, source)
    }
}

/// Weighted mean of per-field confidences over the fields actually present,
/// with a bonus per present critical field and a penalty per missing
/// important one, clamped to [0, 1].
fn overall_confidence(result: &ExtractionResult) -> f32 {
    let mut weighted_sum = 0.0f32;
    let mut total_weight = 0.0f32;

    for (field, weight) in FIELD_WEIGHTS {
        if result.has_field(field) {
            let confidence = result.field_confidence.get(&field).copied().unwrap_or(0.0);
            weighted_sum += confidence * weight;
            total_weight += weight;
        }
    }

    if total_weight == 0.0 {
        return 0.0;
    }

    let mut score = weighted_sum / total_weight;
    for field in CRITICAL_FIELDS {
        if result.has_field(field) {
            score += 0.05;
        }
    }
    for field in IMPORTANT_FIELDS {
        if !result.has_field(field) {
            score -= 0.1;
        }
    }

    score.clamp(0.0, 1.0)
}

/// Last-resort amount scan: any value that looks like a plausible small
/// payment, largest first, skipping the suspiciously common 100.00.
fn find_fallback_amount(text: &str) -> Option<String> {
    let mut values: Vec<f64> = FALLBACK_AMOUNT
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .filter(|v| (5.0..=999.0).contains(v) && *v != 100.0)
        .collect();
    values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    values.first().map(|v| format!("{v}"))
}

/// Deletes the preprocessed OCR copy when extraction is done with it.
struct TempImage(PathBuf);

impl Drop for TempImage {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
