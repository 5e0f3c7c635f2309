//! Validation rules for extracted slip data.
//!
//! Checks correctness and cross-field consistency, producing a list of
//! issues plus a corrected copy of the result (fee defaults, rounding).
//! Only `error`-severity issues make a result invalid.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{ExtractionResult, RailType};

lazy_static! {
    static ref DATE_FORMATS: Vec<Regex> = vec![
        Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap(),
        Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap(),
        Regex::new(r"\d{1,2}\s+\w+\.?\s+\d{2,4}").unwrap(),
    ];
    static ref ALPHANUMERIC: Regex = Regex::new(r"^[a-zA-Z0-9]+$").unwrap();
}

/// Merchants the catalogue can emit as canonical labels.
const KNOWN_MERCHANTS: [&str; 6] = ["Bank", "TrueMoney", "PromptPay", "MyMo", "7-Eleven", "Retail"];

/// Honorifics accepted on person names, full and abbreviated forms.
const HONORIFICS: [&str; 6] = ["นาย", "นาง", "นางสาว", "น.ส.", "ด.ช.", "ด.ญ."];

/// Issue severity, in decreasing order of impact on the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Score penalty per issue of this severity.
    fn penalty(self) -> f32 {
        match self {
            Severity::Error => 0.3,
            Severity::Warning => 0.1,
            Severity::Info => 0.05,
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub severity: Severity,
    pub message: String,
    pub current_value: Option<String>,
    pub suggested_value: Option<String>,
}

impl ValidationIssue {
    fn new(field: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            severity,
            message: message.into(),
            current_value: None,
            suggested_value: None,
        }
    }

    fn with_current(mut self, value: impl ToString) -> Self {
        self.current_value = Some(value.to_string());
        self
    }

    fn with_suggestion(mut self, value: impl ToString) -> Self {
        self.suggested_value = Some(value.to_string());
        self
    }
}

/// Outcome of validating one extraction result.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// True when no error-severity issue was found.
    pub is_valid: bool,
    /// 1.0 minus the accumulated severity penalties, floored at 0.
    pub validation_score: f32,
    pub issues: Vec<ValidationIssue>,
    /// Input with defaults and rounding corrections applied.
    pub corrected: ExtractionResult,
}

/// Rule-based validator for extraction results.
pub struct ReceiptValidator {
    strict: bool,
    now: NaiveDateTime,
}

impl Default for ReceiptValidator {
    fn default() -> Self {
        Self {
            strict: false,
            now: Local::now().naive_local(),
        }
    }
}

impl ReceiptValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply stricter rules (honorific checks on person names).
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Pin the reference clock for date-range checks.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn validate(&self, result: &ExtractionResult) -> ValidationResult {
        let mut issues = Vec::new();
        let mut corrected = result.clone();

        self.check_date(result, &mut issues);
        self.check_amount(result, &mut corrected, &mut issues);
        self.check_fee(&mut corrected, &mut issues);
        self.check_names(result, &mut issues);
        self.check_reference_id(result, &mut issues);
        self.check_merchant(result, &mut issues);
        self.check_relationships(result, &mut issues);
        self.check_confidence(result, &mut issues);

        let penalty: f32 = issues.iter().map(|i| i.severity.penalty()).sum();
        let validation_score = (1.0 - penalty).max(0.0);
        let is_valid = issues.iter().all(|i| i.severity != Severity::Error);

        ValidationResult {
            is_valid,
            validation_score,
            issues,
            corrected,
        }
    }

    fn check_date(&self, result: &ExtractionResult, issues: &mut Vec<ValidationIssue>) {
        let date = match result.date.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => {
                issues.push(ValidationIssue::new("date", Severity::Error, "Date is missing"));
                return;
            }
        };

        if !DATE_FORMATS.iter().any(|p| p.is_match(date)) {
            issues.push(
                ValidationIssue::new("date", Severity::Warning, "Date format may be invalid")
                    .with_current(date),
            );
        }

        if let Some(parsed) = parse_date(date) {
            if parsed > self.now + Duration::days(1) {
                issues.push(
                    ValidationIssue::new("date", Severity::Error, "Date is in the future")
                        .with_current(date),
                );
            } else if parsed < self.now - Duration::days(365 * 5) {
                issues.push(
                    ValidationIssue::new(
                        "date",
                        Severity::Warning,
                        "Date is more than 5 years old",
                    )
                    .with_current(date),
                );
            }
        }
    }

    fn check_amount(
        &self,
        result: &ExtractionResult,
        corrected: &mut ExtractionResult,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let amount = match result.amount {
            Some(a) => a,
            None => {
                issues.push(ValidationIssue::new(
                    "amount",
                    Severity::Error,
                    "Amount is missing",
                ));
                return;
            }
        };

        if amount <= Decimal::ZERO {
            issues.push(
                ValidationIssue::new("amount", Severity::Error, "Amount must be positive")
                    .with_current(amount),
            );
        }

        if amount > Decimal::from(10_000_000) {
            issues.push(
                ValidationIssue::new(
                    "amount",
                    Severity::Warning,
                    "Amount is unusually large (>10M THB)",
                )
                .with_current(amount),
            );
        }

        if amount > Decimal::ZERO && amount < Decimal::new(1, 2) {
            issues.push(
                ValidationIssue::new("amount", Severity::Warning, "Amount is unusually small")
                    .with_current(amount),
            );
        }

        if amount.scale() > 2 {
            let rounded = amount.round_dp(2);
            issues.push(
                ValidationIssue::new(
                    "amount",
                    Severity::Warning,
                    "Amount has more than 2 decimal places",
                )
                .with_current(amount)
                .with_suggestion(rounded),
            );
            corrected.amount = Some(rounded);
        }
    }

    fn check_fee(&self, corrected: &mut ExtractionResult, issues: &mut Vec<ValidationIssue>) {
        let fee = match corrected.fee {
            Some(f) => f,
            None => {
                // Missing fee reads as zero.
                corrected.fee = Some(Decimal::ZERO);
                return;
            }
        };

        if fee < Decimal::ZERO {
            issues.push(
                ValidationIssue::new("fee", Severity::Error, "Fee cannot be negative")
                    .with_current(fee)
                    .with_suggestion(Decimal::ZERO),
            );
            corrected.fee = Some(Decimal::ZERO);
        }

        let amount = corrected.amount.unwrap_or(Decimal::ZERO);
        if fee > amount {
            issues.push(
                ValidationIssue::new("fee", Severity::Error, "Fee is larger than amount")
                    .with_current(fee),
            );
        }
    }

    fn check_names(&self, result: &ExtractionResult, issues: &mut Vec<ValidationIssue>) {
        for (field, name) in [
            ("sender_name", result.sender_name.as_deref()),
            ("receiver_name", result.receiver_name.as_deref()),
        ] {
            let name = match name {
                Some(n) if !n.is_empty() => n,
                _ => {
                    issues.push(ValidationIssue::new(
                        field,
                        Severity::Warning,
                        format!("{} is missing", label(field)),
                    ));
                    continue;
                }
            };

            if name.chars().count() < 3 {
                issues.push(
                    ValidationIssue::new(
                        field,
                        Severity::Warning,
                        format!("{} is too short", label(field)),
                    )
                    .with_current(name),
                );
            }

            if self.strict && !HONORIFICS.iter().any(|t| name.contains(t)) {
                issues.push(
                    ValidationIssue::new(
                        field,
                        Severity::Info,
                        format!("{} does not have Thai title", label(field)),
                    )
                    .with_current(name),
                );
            }
        }

        if let (Some(sender), Some(receiver)) =
            (result.sender_name.as_deref(), result.receiver_name.as_deref())
        {
            if !sender.is_empty() && sender == receiver {
                issues.push(
                    ValidationIssue::new(
                        "sender_name",
                        Severity::Warning,
                        "Sender and receiver names are identical",
                    )
                    .with_current(sender),
                );
            }
        }
    }

    fn check_reference_id(&self, result: &ExtractionResult, issues: &mut Vec<ValidationIssue>) {
        let ref_id = match result.reference_id.as_deref() {
            Some(r) if !r.is_empty() => r,
            _ => {
                issues.push(ValidationIssue::new(
                    "reference_id",
                    Severity::Info,
                    "Reference ID is missing",
                ));
                return;
            }
        };

        if !ALPHANUMERIC.is_match(ref_id) {
            issues.push(
                ValidationIssue::new(
                    "reference_id",
                    Severity::Warning,
                    "Reference ID contains invalid characters",
                )
                .with_current(ref_id),
            );
        }

        let len = ref_id.chars().count();
        if len < 8 {
            issues.push(
                ValidationIssue::new("reference_id", Severity::Warning, "Reference ID is too short")
                    .with_current(ref_id),
            );
        } else if len > 50 {
            issues.push(
                ValidationIssue::new("reference_id", Severity::Warning, "Reference ID is too long")
                    .with_current(ref_id),
            );
        }
    }

    fn check_merchant(&self, result: &ExtractionResult, issues: &mut Vec<ValidationIssue>) {
        let merchant = match result.merchant.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => {
                issues.push(ValidationIssue::new(
                    "merchant",
                    Severity::Warning,
                    "Merchant is missing",
                ));
                return;
            }
        };

        if !KNOWN_MERCHANTS.contains(&merchant) {
            issues.push(
                ValidationIssue::new(
                    "merchant",
                    Severity::Info,
                    format!("Merchant \"{merchant}\" is not in known list"),
                )
                .with_current(merchant),
            );
        }
    }

    fn check_relationships(&self, result: &ExtractionResult, issues: &mut Vec<ValidationIssue>) {
        let merchant = result.merchant.as_deref().unwrap_or("");

        match result.source.rail {
            RailType::Bank => {
                if !merchant.is_empty() && merchant != "Bank" {
                    issues.push(
                        ValidationIssue::new(
                            "merchant",
                            Severity::Warning,
                            format!("Source rail is \"bank\" but merchant is \"{merchant}\""),
                        )
                        .with_current(merchant)
                        .with_suggestion("Bank"),
                    );
                }
            }
            RailType::EWallet => {
                let brand = &result.source.brand;
                if !brand.is_empty() && merchant != brand {
                    issues.push(
                        ValidationIssue::new(
                            "merchant",
                            Severity::Info,
                            format!(
                                "Merchant \"{merchant}\" does not match source brand \"{brand}\""
                            ),
                        )
                        .with_current(merchant)
                        .with_suggestion(brand),
                    );
                }
            }
            _ => {}
        }
    }

    fn check_confidence(&self, result: &ExtractionResult, issues: &mut Vec<ValidationIssue>) {
        let overall = result.overall_confidence;
        if overall < 0.5 {
            issues.push(
                ValidationIssue::new(
                    "overall_confidence",
                    Severity::Error,
                    "Overall confidence is very low (<50%)",
                )
                .with_current(overall),
            );
        } else if overall < 0.7 {
            issues.push(
                ValidationIssue::new(
                    "overall_confidence",
                    Severity::Warning,
                    "Overall confidence is low (<70%)",
                )
                .with_current(overall),
            );
        }

        for (field, confidence) in &result.field_confidence {
            if *confidence > 0.0 && *confidence < 0.5 {
                issues.push(
                    ValidationIssue::new(
                        &format!("confidence.{field}"),
                        Severity::Warning,
                        format!("{field} confidence is low (<50%)"),
                    )
                    .with_current(confidence),
                );
            }
        }
    }
}

/// Human label for an issue field.
fn label(field: &str) -> &'static str {
    match field {
        "sender_name" => "Sender name",
        _ => "Receiver name",
    }
}

fn parse_date(date: &str) -> Option<NaiveDateTime> {
    for fmt in ["%d/%m/%Y %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(date, fmt) {
            return Some(parsed);
        }
    }
    for fmt in ["%d/%m/%Y", "%Y-%m-%d"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(date, fmt) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use crate::models::Source;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn validator() -> ReceiptValidator {
        ReceiptValidator::new().with_now(fixed_now())
    }

    fn good_result() -> ExtractionResult {
        let mut result = ExtractionResult {
            date: Some("18/09/2025 12:20".to_string()),
            merchant: Some("Bank".to_string()),
            reference_id: Some("202509181220123456".to_string()),
            amount: Some(dec("3000.00")),
            fee: Some(dec("0.00")),
            sender_name: Some("นาย สมชาย ใจดี".to_string()),
            receiver_name: Some("นาง สมหญิง รักเรียน".to_string()),
            source: Source::new(RailType::Bank, "Bank"),
            ..Default::default()
        };
        for field in [
            Field::Date,
            Field::Amount,
            Field::ReferenceId,
            Field::Merchant,
            Field::SenderName,
            Field::ReceiverName,
        ] {
            result.field_confidence.insert(field, 0.9);
        }
        result.overall_confidence = 0.85;
        result
    }

    #[test]
    fn clean_result_is_valid_with_full_score() {
        let outcome = validator().validate(&good_result());
        assert!(outcome.is_valid);
        assert_eq!(outcome.validation_score, 1.0);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn missing_date_and_amount_are_errors() {
        let result = ExtractionResult::default();
        let outcome = validator().validate(&result);
        assert!(!outcome.is_valid);
        let errors: Vec<&str> = outcome
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.field.as_str())
            .collect();
        assert!(errors.contains(&"date"));
        assert!(errors.contains(&"amount"));
        assert!(errors.contains(&"overall_confidence"));
    }

    #[test]
    fn future_date_is_an_error() {
        let mut result = good_result();
        result.date = Some("18/09/2027 12:20".to_string());
        let outcome = validator().validate(&result);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.field == "date" && i.severity == Severity::Error));
    }

    #[test]
    fn old_date_is_a_warning() {
        let mut result = good_result();
        result.date = Some("18/09/2019 12:20".to_string());
        let outcome = validator().validate(&result);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.field == "date" && i.severity == Severity::Warning));
        assert!(outcome.is_valid);
    }

    #[test]
    fn missing_fee_is_corrected_to_zero_without_issue() {
        let mut result = good_result();
        result.fee = None;
        let outcome = validator().validate(&result);
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.corrected.fee, Some(Decimal::ZERO));
    }

    #[test]
    fn negative_fee_is_an_error_and_corrected() {
        let mut result = good_result();
        result.fee = Some(dec("-5.00"));
        let outcome = validator().validate(&result);
        assert!(!outcome.is_valid);
        assert_eq!(outcome.corrected.fee, Some(Decimal::ZERO));
    }

    #[test]
    fn fee_larger_than_amount_is_an_error() {
        let mut result = good_result();
        result.amount = Some(dec("10.00"));
        result.fee = Some(dec("25.00"));
        let outcome = validator().validate(&result);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.field == "fee" && i.severity == Severity::Error));
    }

    #[test]
    fn excess_decimal_places_are_rounded_in_corrected() {
        let mut result = good_result();
        result.amount = Some(dec("99.999"));
        let outcome = validator().validate(&result);
        assert_eq!(outcome.corrected.amount, Some(dec("100.00")));
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.field == "amount" && i.severity == Severity::Warning));
    }

    #[test]
    fn identical_names_are_a_warning() {
        let mut result = good_result();
        result.receiver_name = result.sender_name.clone();
        let outcome = validator().validate(&result);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.message.contains("identical")));
        assert!(outcome.is_valid);
    }

    #[test]
    fn strict_mode_flags_untitled_names() {
        let mut result = good_result();
        result.sender_name = Some("สมชาย ใจดี".to_string());
        let outcome = ReceiptValidator::new()
            .strict()
            .with_now(fixed_now())
            .validate(&result);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.field == "sender_name" && i.severity == Severity::Info));
    }

    #[test]
    fn bank_rail_with_other_merchant_suggests_bank() {
        let mut result = good_result();
        result.merchant = Some("กาแฟดอย".to_string());
        let outcome = validator().validate(&result);
        let issue = outcome
            .issues
            .iter()
            .find(|i| i.field == "merchant" && i.severity == Severity::Warning)
            .unwrap();
        assert_eq!(issue.suggested_value.as_deref(), Some("Bank"));
    }

    #[test]
    fn ewallet_merchant_brand_mismatch_is_informational() {
        let mut result = good_result();
        result.source = Source::new(RailType::EWallet, "TrueMoney");
        result.merchant = Some("PromptPay".to_string());
        let outcome = validator().validate(&result);
        let issue = outcome
            .issues
            .iter()
            .find(|i| i.field == "merchant" && i.severity == Severity::Info)
            .unwrap();
        assert_eq!(issue.suggested_value.as_deref(), Some("TrueMoney"));
    }

    #[test]
    fn low_field_confidence_is_flagged_per_field() {
        let mut result = good_result();
        result.field_confidence.insert(Field::Fee, 0.3);
        result.fee = Some(dec("0.00"));
        let outcome = validator().validate(&result);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.field == "confidence.fee"));
    }

    #[test]
    fn score_drops_by_severity_weights() {
        // One error (0.3) and one warning (0.1) from a short reference id
        // plus low overall confidence.
        let mut result = good_result();
        result.overall_confidence = 0.4;
        result.reference_id = Some("AB12".to_string());
        let outcome = validator().validate(&result);
        assert!(!outcome.is_valid);
        assert!((outcome.validation_score - 0.6).abs() < 1e-6);
    }
}
