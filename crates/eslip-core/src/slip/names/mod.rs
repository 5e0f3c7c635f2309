//! Per-rail sender/receiver name resolution.
//!
//! Dispatch key is the detected brand: wallet transfers list accounts around
//! a marker phrase, bank transfers carry honorific-prefixed names, and
//! everything else goes through the generic pattern lists. Each branch is an
//! independent strategy behind a common `resolve` call.

mod bank;
mod generic;
mod wallet;

pub use bank::BankResolver;
pub use generic::GenericResolver;
pub use wallet::WalletResolver;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::receipt::Source;
use crate::ocr::TextBlock;

use super::catalog::RuleCatalog;

lazy_static! {
    static ref ORG_REGION: Regex =
        Regex::new(r"[ก-๙a-zA-Z\.]+(?:ตะวันออก|ตะวันตก|เหนือ|ใต้|กลาง)").unwrap();
    static ref ORG_NOUN: Regex =
        Regex::new(r"มทร\.|บทร\.|โรงเรียน|มหาวิทยาลัย|วิทยาลัย").unwrap();
    static ref PAREN_FRAGMENT: Regex =
        Regex::new(r"\([ก-๙a-zA-Z\s]*\)|\([ก-๙a-zA-Z\s]*$|^[ก-๙a-zA-Z\s]*\)").unwrap();
    static ref THAI_WORD: Regex = Regex::new(r"^[ก-๙]{2,}$").unwrap();
}

/// Sender/receiver attribution for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedNames {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    /// Confidence carried over from the generic extractor (zero when its
    /// rules missed). Rail branches leave these unset and the pipeline
    /// applies its per-rail defaults.
    pub sender_confidence: Option<f32>,
    pub receiver_confidence: Option<f32>,
}

/// Name resolution strategy selected per document.
pub enum NameResolver<'a> {
    Wallet(WalletResolver),
    Bank(BankResolver),
    Generic(GenericResolver<'a>),
}

impl<'a> NameResolver<'a> {
    /// Pick the branch for a detected source.
    pub fn for_source(source: &Source, catalog: &'a RuleCatalog) -> Self {
        match source.brand.as_str() {
            "TrueMoney" => NameResolver::Wallet(WalletResolver::new()),
            "Bank" => NameResolver::Bank(BankResolver::new()),
            _ => NameResolver::Generic(GenericResolver::new(catalog)),
        }
    }

    /// Resolve sender and receiver from the document.
    pub fn resolve(&self, text: &str, blocks: &[TextBlock]) -> ResolvedNames {
        match self {
            NameResolver::Wallet(r) => r.resolve(text, blocks),
            NameResolver::Bank(r) => r.resolve(text, blocks),
            NameResolver::Generic(r) => r.resolve(text, blocks),
        }
    }
}

/// Reconstruct a receiver name OCR has split across blocks.
///
/// Institutions often arrive as separate fragments (a campus name, then a
/// parenthetical purpose on the next line); this stitches adjacent
/// medium-confidence fragments back together and de-duplicates overlapping
/// word pieces. PromptPay slips additionally get a bare-honorific block
/// reassembled with the high-confidence name blocks that follow it.
pub fn reconstruct_receiver(
    text: &str,
    blocks: &[TextBlock],
    min_confidence: f32,
) -> Option<String> {
    let mut org_parts: Vec<&str> = Vec::new();
    for block in blocks {
        if block.confidence < min_confidence {
            continue;
        }
        let span = block.text.trim();
        if ORG_REGION.is_match(span)
            || ORG_NOUN.is_match(span)
            || span.starts_with('(')
            || PAREN_FRAGMENT.is_match(span)
            || ["ศึกษา", "การศึกษา", "ค่าธรรมเนียม"]
                .iter()
                .any(|t| span.contains(t))
        {
            org_parts.push(span);
        }
    }

    if org_parts.len() >= 2 {
        let mut combined = org_parts.join(" ");
        if combined.contains("ศึกษา")
            && (combined.contains("มทร") || combined.contains("บทร"))
        {
            combined = balance_parens(combined);
            combined = dedup_fragments(&combined);
            return Some(combined);
        }
        return Some(combined);
    } else if org_parts.len() == 1 && org_parts[0].chars().count() > 10 {
        return Some(org_parts[0].to_string());
    }

    if text.contains("PromptPay") || text.contains("พร้อมเพย์") {
        return reassemble_split_name(blocks);
    }

    None
}

/// A bare honorific block followed by high-confidence single-word name
/// blocks, put back together in order.
fn reassemble_split_name(blocks: &[TextBlock]) -> Option<String> {
    let titles = ["นาย", "นาง", "นางสาว"];

    for (i, block) in blocks.iter().enumerate() {
        if block.confidence < 0.8 || !titles.contains(&block.text.trim()) {
            continue;
        }

        let parts: Vec<&str> = blocks[i + 1..]
            .iter()
            .filter(|b| b.confidence >= 0.8)
            .map(|b| b.text.trim())
            .filter(|t| THAI_WORD.is_match(t))
            .take(2)
            .collect();

        if !parts.is_empty() {
            return Some(format!("{} {}", block.text.trim(), parts.join(" ")));
        }
    }

    None
}

fn balance_parens(mut combined: String) -> String {
    if combined.contains('(') && !combined.contains(')') {
        combined.push(')');
    } else if combined.contains(')') && !combined.contains('(') {
        combined = combined.replacen(')', "(", 1);
    }
    combined
}

/// Drop word fragments that are substrings of another fragment; the longer
/// fragment wins its slot.
fn dedup_fragments(combined: &str) -> String {
    let mut kept: Vec<String> = Vec::new();
    for word in combined.split_whitespace() {
        let mut duplicate = false;
        for prev in kept.iter_mut() {
            if word.contains(prev.as_str()) || prev.contains(word) {
                if word.len() > prev.len() {
                    *prev = word.to_string();
                }
                duplicate = true;
                break;
            }
        }
        if !duplicate {
            kept.push(word.to_string());
        }
    }
    kept.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::RailType;
    use pretty_assertions::assert_eq;

    #[test]
    fn dispatch_follows_detected_brand() {
        let catalog = RuleCatalog::thai();
        let wallet = Source::new(RailType::EWallet, "TrueMoney");
        let bank = Source::new(RailType::Bank, "Bank");
        let other = Source::new(RailType::EWallet, "PromptPay");

        assert!(matches!(
            NameResolver::for_source(&wallet, &catalog),
            NameResolver::Wallet(_)
        ));
        assert!(matches!(
            NameResolver::for_source(&bank, &catalog),
            NameResolver::Bank(_)
        ));
        assert!(matches!(
            NameResolver::for_source(&other, &catalog),
            NameResolver::Generic(_)
        ));
    }

    #[test]
    fn split_institution_name_is_stitched_and_deduplicated() {
        let blocks = vec![
            TextBlock::new("มทร.ตะวันออก", 0.85),
            TextBlock::new("(ค่าธรรมเนียมการศึกษา)", 0.7),
        ];
        let name = reconstruct_receiver("", &blocks, 0.6).unwrap();
        assert_eq!(name, "มทร.ตะวันออก (ค่าธรรมเนียมการศึกษา)");
    }

    #[test]
    fn single_long_institution_fragment_is_accepted() {
        let blocks = vec![TextBlock::new("มหาวิทยาลัยเทคโนโลยีราชมงคล", 0.8)];
        let name = reconstruct_receiver("", &blocks, 0.6).unwrap();
        assert_eq!(name, "มหาวิทยาลัยเทคโนโลยีราชมงคล");
    }

    #[test]
    fn low_confidence_fragments_are_ignored() {
        let blocks = vec![
            TextBlock::new("มทร.ตะวันออก", 0.3),
            TextBlock::new("(ค่าธรรมเนียมการศึกษา)", 0.2),
        ];
        assert_eq!(reconstruct_receiver("", &blocks, 0.6), None);
    }

    #[test]
    fn promptpay_split_honorific_is_reassembled() {
        let blocks = vec![
            TextBlock::new("พร้อมเพย์", 0.9),
            TextBlock::new("นาง", 0.85),
            TextBlock::new("ยุพดี", 0.9),
            TextBlock::new("เจียมจรรยา", 0.88),
        ];
        let name = reconstruct_receiver("พร้อมเพย์ 0812345678", &blocks, 0.6).unwrap();
        assert_eq!(name, "นาง ยุพดี เจียมจรรยา");
    }

    #[test]
    fn fragment_dedup_keeps_the_longer_piece() {
        assert_eq!(dedup_fragments("มทร มทร.ตะวันออก ศึกษา"), "มทร.ตะวันออก ศึกษา");
    }
}
