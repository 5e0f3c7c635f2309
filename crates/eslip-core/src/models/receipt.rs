//! Extraction result model and the wire JSON contract.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

/// A transaction field the extractor knows about.
///
/// Serializes to the snake_case name used as the key of the per-field
/// confidence map on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Merchant,
    ReferenceId,
    Amount,
    Fee,
    SenderName,
    ReceiverName,
}

impl Field {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Merchant => "merchant",
            Field::ReferenceId => "reference_id",
            Field::Amount => "amount",
            Field::Fee => "fee",
            Field::SenderName => "sender_name",
            Field::ReceiverName => "receiver_name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payment rail a slip came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RailType {
    Bank,
    EWallet,
    Retail,
    RideHailing,
    FoodDelivery,
    Unknown,
}

/// Detected payment source: rail type plus brand name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Rail type ("type" on the wire).
    #[serde(rename = "type")]
    pub rail: RailType,
    /// Brand name, "unknown" when undetected.
    pub brand: String,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            rail: RailType::Unknown,
            brand: "unknown".to_string(),
        }
    }
}

impl Source {
    pub fn new(rail: RailType, brand: impl Into<String>) -> Self {
        Self {
            rail,
            brand: brand.into(),
        }
    }
}

/// Structured result of extracting one slip.
///
/// Field order matches the wire contract consumed downstream. The overall
/// confidence is always derived from the per-field map by the pipeline's
/// aggregation rule and is serialized rounded to 3 decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Transaction date string, Gregorian year.
    pub date: Option<String>,
    /// Merchant or counterparty business name.
    pub merchant: Option<String>,
    /// Transaction reference identifier.
    pub reference_id: Option<String>,
    /// Transaction amount, 2 decimal places.
    pub amount: Option<Decimal>,
    /// Transfer fee, 2 decimal places.
    pub fee: Option<Decimal>,
    /// Sender account holder name.
    pub sender_name: Option<String>,
    /// Receiver account holder name.
    pub receiver_name: Option<String>,
    /// Payment source rail and brand.
    #[serde(default)]
    pub source: Source,
    /// Per-field confidence scores in [0, 1].
    #[serde(rename = "confidence", default)]
    pub field_confidence: BTreeMap<Field, f32>,
    /// Aggregate confidence in [0, 1].
    #[serde(serialize_with = "round3")]
    #[serde(default)]
    pub overall_confidence: f32,
}

fn round3<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(((*value as f64) * 1000.0).round() / 1000.0)
}

impl ExtractionResult {
    /// True when no field was extracted at all.
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.merchant.is_none()
            && self.reference_id.is_none()
            && self.amount.is_none()
            && self.fee.is_none()
            && self.sender_name.is_none()
            && self.receiver_name.is_none()
    }

    /// Whether the given field carries a value.
    pub fn has_field(&self, field: Field) -> bool {
        match field {
            Field::Date => self.date.is_some(),
            Field::Merchant => self.merchant.is_some(),
            Field::ReferenceId => self.reference_id.is_some(),
            Field::Amount => self.amount.is_some(),
            Field::Fee => self.fee.is_some(),
            Field::SenderName => self.sender_name.is_some(),
            Field::ReceiverName => self.receiver_name.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn wire_shape_has_exact_keys() {
        let mut result = ExtractionResult {
            date: Some("31/08/2025 14:50".to_string()),
            merchant: Some("Bank".to_string()),
            reference_id: Some("202508311450123456".to_string()),
            amount: Some(dec("3000.00")),
            fee: Some(dec("0.00")),
            sender_name: Some("นาย สมชาย".to_string()),
            receiver_name: Some("นาง สมหญิง".to_string()),
            source: Source::new(RailType::Bank, "Bank"),
            ..Default::default()
        };
        result.field_confidence.insert(Field::Amount, 0.92);
        result.overall_confidence = 0.8524;

        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 10);

        // `to_value` sorts map keys; declaration order survives in the
        // rendered string, so check the key sequence there.
        let wire = serde_json::to_string(&result).unwrap();
        let mut last = 0;
        for key in [
            "\"date\":",
            "\"merchant\":",
            "\"reference_id\":",
            "\"amount\":",
            "\"fee\":",
            "\"sender_name\":",
            "\"receiver_name\":",
            "\"source\":",
            "\"confidence\":",
            "\"overall_confidence\":",
        ] {
            let found = wire[last..].find(key);
            assert!(found.is_some(), "missing or out of order: {key} in {wire}");
            last += found.unwrap() + key.len();
        }
        assert_eq!(json["source"]["type"], "bank");
        assert_eq!(json["overall_confidence"], 0.852);
        assert_eq!(json["confidence"]["amount"], 0.92f32);
        // Amounts must be numbers on the wire, not strings.
        assert!(json["amount"].is_number());
    }

    #[test]
    fn default_source_is_unknown() {
        let result = ExtractionResult::default();
        assert_eq!(result.source.rail, RailType::Unknown);
        assert_eq!(result.source.brand, "unknown");
        assert!(result.is_empty());
    }
}
