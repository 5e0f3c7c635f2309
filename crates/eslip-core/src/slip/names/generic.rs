//! Catalog-driven name resolution for slips with no rail-specific layout.

use crate::models::Field;
use crate::ocr::TextBlock;
use crate::slip::catalog::RuleCatalog;
use crate::slip::fields::extract_field;

use super::{reconstruct_receiver, ResolvedNames};

/// Resolver backed by the generic sender/receiver rules of the catalog.
#[derive(Debug, Clone)]
pub struct GenericResolver<'a> {
    catalog: &'a RuleCatalog,
    org_threshold: f32,
}

impl<'a> GenericResolver<'a> {
    pub fn new(catalog: &'a RuleCatalog) -> Self {
        Self {
            catalog,
            org_threshold: 0.6,
        }
    }

    pub fn with_org_threshold(mut self, threshold: f32) -> Self {
        self.org_threshold = threshold;
        self
    }

    pub fn resolve(&self, text: &str, blocks: &[TextBlock]) -> ResolvedNames {
        let mut names = ResolvedNames::default();

        // Misses still report a zero so the result's confidence map covers
        // both name fields on the generic rail.
        match extract_field(
            text,
            self.catalog.rules_for(Field::SenderName),
            blocks,
            Field::SenderName,
        ) {
            Some(hit) => {
                names.sender = Some(hit.value);
                names.sender_confidence = Some(hit.confidence);
            }
            None => names.sender_confidence = Some(0.0),
        }

        match extract_field(
            text,
            self.catalog.rules_for(Field::ReceiverName),
            blocks,
            Field::ReceiverName,
        ) {
            Some(hit) => {
                names.receiver = Some(hit.value);
                names.receiver_confidence = Some(hit.confidence);
            }
            None => names.receiver_confidence = Some(0.0),
        }

        // Proxy identifiers and truncated spans are worth a second look at
        // the raw blocks; keep whichever candidate carries more words.
        if needs_reconstruction(names.receiver.as_deref()) {
            if let Some(rebuilt) = reconstruct_receiver(text, blocks, self.org_threshold) {
                let current_words = names
                    .receiver
                    .as_deref()
                    .map(|r| r.split_whitespace().count())
                    .unwrap_or(0);
                if rebuilt.split_whitespace().count() > current_words {
                    names.receiver = Some(rebuilt);
                }
            }
        }

        names
    }
}

/// A missing receiver, a PromptPay proxy string, or a span shorter than a
/// plausible Thai full name all warrant block-level reconstruction.
fn needs_reconstruction(receiver: Option<&str>) -> bool {
    match receiver {
        None => true,
        Some(value) => {
            let lower = value.to_lowercase();
            lower.contains("พร้อมเพย์")
                || lower.contains("pomnipay")
                || value.split_whitespace().count() < 3
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_both_names_from_catalog_rules() {
        let catalog = RuleCatalog::thai();
        let text = "จาก นาย สมชาย ใจดี บัญชี\nถึง นาง สมหญิง รักเรียน ธนาคาร";
        let names = GenericResolver::new(&catalog).resolve(text, &[]);
        assert!(names.sender.as_deref().unwrap_or("").contains("สมชาย"));
        assert!(names.receiver.as_deref().unwrap_or("").contains("สมหญิง"));
        assert!(names.sender_confidence.is_some());
    }

    #[test]
    fn promptpay_receiver_is_rebuilt_from_blocks() {
        let catalog = RuleCatalog::thai();
        let text = "ไปยัง พร้อมเพย์ x-1234";
        let blocks = vec![
            TextBlock::new("พร้อมเพย์", 0.9),
            TextBlock::new("นาง", 0.9),
            TextBlock::new("ยุพดี", 0.9),
            TextBlock::new("เจียมจรรยา", 0.9),
        ];
        let names = GenericResolver::new(&catalog).resolve(text, &blocks);
        assert_eq!(names.receiver.as_deref(), Some("นาง ยุพดี เจียมจรรยา"));
    }

    #[test]
    fn keeps_catalog_receiver_when_reconstruction_is_shorter() {
        let needs = needs_reconstruction(Some("นาง สมหญิง"));
        assert!(needs);
        assert!(!needs_reconstruction(Some("นาง สมหญิง รักเรียน")));
    }
}
