//! Generic pattern-driven field extraction with confidence scoring.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::models::receipt::Field;
use crate::ocr::TextBlock;

use super::catalog::FieldRule;

lazy_static! {
    static ref STRICT_AMOUNT: Regex = Regex::new(r"^\d+([.,]\d{2})?$").unwrap();
    static ref DATE_SHAPES: Vec<Regex> = vec![
        Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4}").unwrap(),
        Regex::new(r"\d{1,2}-\d{1,2}-\d{2,4}").unwrap(),
        Regex::new(r"\d{1,2}\s+[ก-๙]{1,3}\.?\s*\d{2,4}").unwrap(),
    ];
    static ref REFERENCE_SHAPE: Regex = Regex::new(r"^[A-Za-z0-9:]+$").unwrap();
    static ref THAI_LETTERS: Regex = Regex::new(r"[ก-๙]").unwrap();
}

/// Thai honorific prefixes recognized on person names.
pub const THAI_TITLES: [&str; 3] = ["นาย", "นาง", "นางสาว"];

/// An extracted field candidate with its confidence estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExtraction {
    /// Raw candidate text, pre-normalization.
    pub value: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

/// Try each rule in priority order against the full text; first match wins.
///
/// A multi-group match joins its non-empty capture groups with a single
/// space. Returns `None` when no rule matches; the caller records 0.0
/// confidence for the field in that case.
pub fn extract_field(
    text: &str,
    rules: &[FieldRule],
    blocks: &[TextBlock],
    field: Field,
) -> Option<FieldExtraction> {
    for (index, rule) in rules.iter().enumerate() {
        let Some(caps) = rule.pattern.captures(text) else {
            continue;
        };

        let groups: Vec<&str> = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect();
        if groups.is_empty() {
            continue;
        }
        let value = groups.join(" ").trim().to_string();

        let confidence = field_confidence(&value, index, rules.len(), blocks, field);
        trace!(
            field = %field,
            rule = index,
            confidence,
            "matched {value:?}"
        );

        return Some(FieldExtraction { value, confidence });
    }

    None
}

/// Weighted combination of pattern priority, OCR evidence, and format
/// plausibility. The weights (0.3 / 0.4 / 0.3) and per-field thresholds are
/// a behavioral contract; downstream confidence aggregation depends on them.
fn field_confidence(
    value: &str,
    rule_index: usize,
    total_rules: usize,
    blocks: &[TextBlock],
    field: Field,
) -> f32 {
    if value.is_empty() {
        return 0.0;
    }

    let pattern_score = 1.0 - (rule_index as f32 / total_rules.max(1) as f32);
    let ocr_score = ocr_evidence(value, blocks);
    let format_score = format_score(value, field);

    (pattern_score * 0.3 + ocr_score * 0.4 + format_score * 0.3).clamp(0.0, 1.0)
}

/// Best supporting OCR evidence for a candidate: per block, the fraction of
/// the candidate's words that appear in the block, weighted by the block's
/// confidence; maximum over all blocks. Zero without blocks.
fn ocr_evidence(value: &str, blocks: &[TextBlock]) -> f32 {
    let target: HashSet<String> = value.to_lowercase().split_whitespace().map(str::to_string).collect();
    if target.is_empty() {
        return 0.0;
    }

    let mut best = 0.0f32;
    for block in blocks {
        let words: HashSet<String> = block
            .text
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let overlap = target.intersection(&words).count();
        if overlap > 0 {
            let ratio = overlap as f32 / target.len() as f32;
            best = best.max(block.confidence * ratio);
        }
    }

    best
}

/// Field-specific plausibility of the candidate's shape.
pub(crate) fn format_score(value: &str, field: Field) -> f32 {
    match field {
        Field::Amount | Field::Fee => {
            let stripped = value.replace(',', "");
            if stripped.parse::<f64>().is_err() {
                return 0.0;
            }
            if STRICT_AMOUNT.is_match(&stripped) {
                1.0
            } else {
                0.7
            }
        }
        Field::Date => {
            if DATE_SHAPES.iter().any(|p| p.is_match(value)) {
                0.9
            } else {
                0.5
            }
        }
        Field::ReferenceId => {
            if value.len() >= 8 && REFERENCE_SHAPE.is_match(value) {
                0.9
            } else {
                0.6
            }
        }
        Field::SenderName | Field::ReceiverName => {
            if THAI_LETTERS.is_match(value) || value.chars().any(|c| c.is_ascii_alphabetic()) {
                if THAI_TITLES.iter().any(|t| value.contains(t)) {
                    0.9
                } else {
                    0.7
                }
            } else {
                0.3
            }
        }
        Field::Merchant => 0.6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slip::catalog::RuleCatalog;
    use pretty_assertions::assert_eq;

    fn catalog() -> RuleCatalog {
        RuleCatalog::thai()
    }

    #[test]
    fn first_matching_rule_wins_without_backtracking() {
        let text = "ยอดรวม: 150.00\n999.99 บาท";
        let hit = extract_field(text, catalog().rules_for(Field::Amount), &[], Field::Amount)
            .unwrap();
        // Rule 0 (labelled total) matches, so the later บาท rule never runs.
        assert_eq!(hit.value, "150.00");
    }

    #[test]
    fn no_match_yields_none() {
        let text = "ไม่มีตัวเลขที่นี่";
        assert_eq!(
            extract_field(text, catalog().rules_for(Field::Amount), &[], Field::Amount),
            None
        );
    }

    #[test]
    fn multi_group_date_joins_with_space() {
        let text = "18/09/2025 | 12:20";
        let hit =
            extract_field(text, catalog().rules_for(Field::Date), &[], Field::Date).unwrap();
        assert_eq!(hit.value, "18/09/2025 12:20");
    }

    #[test]
    fn confidence_combines_three_weighted_factors() {
        let blocks = vec![TextBlock::new("ยอดรวม: 150.00", 0.9)];
        let text = "ยอดรวม: 150.00";
        let hit =
            extract_field(text, catalog().rules_for(Field::Amount), &blocks, Field::Amount)
                .unwrap();
        // pattern 1.0 * 0.3 + ocr (0.9 * 1.0) * 0.4 + format 1.0 * 0.3
        assert!((hit.confidence - 0.96).abs() < 1e-6);
    }

    #[test]
    fn ocr_evidence_is_zero_without_blocks() {
        let text = "ยอดรวม: 150.00";
        let hit = extract_field(text, catalog().rules_for(Field::Amount), &[], Field::Amount)
            .unwrap();
        // pattern 1.0 * 0.3 + format 1.0 * 0.3, no OCR contribution
        assert!((hit.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn format_scores_follow_the_contract() {
        assert_eq!(format_score("123.45", Field::Amount), 1.0);
        assert_eq!(format_score("1234.5", Field::Amount), 0.7);
        assert_eq!(format_score("abc", Field::Amount), 0.0);
        assert_eq!(format_score("31/08/2568", Field::Date), 0.9);
        assert_eq!(format_score("someday", Field::Date), 0.5);
        assert_eq!(format_score("ABC12345678", Field::ReferenceId), 0.9);
        assert_eq!(format_score("AB12", Field::ReferenceId), 0.6);
        assert_eq!(format_score("นาย สมชาย ใจดี", Field::SenderName), 0.9);
        assert_eq!(format_score("สมชาย ใจดี", Field::SenderName), 0.7);
        assert_eq!(format_score("12345", Field::SenderName), 0.3);
    }

    #[test]
    fn confidence_never_leaves_unit_interval() {
        let blocks = vec![TextBlock::new("จำนวนเงิน 3,000.00 บาท", 1.0)];
        let text = "จำนวนเงิน 3,000.00 บาท";
        let hit =
            extract_field(text, catalog().rules_for(Field::Amount), &blocks, Field::Amount)
                .unwrap();
        assert!((0.0..=1.0).contains(&hit.confidence));
    }
}
