//! Bank-transfer name resolution.
//!
//! Bank slips usually carry honorific-prefixed names in reading order:
//! sender first, receiver second. When the block scan finds nothing, a
//! context-window pass classifies name candidates by the keywords around
//! them. The trailing fallbacks (single name = sender only, two identical
//! names = self-transfer) are preserved heuristics of uncertain intent, not
//! guaranteed-correct behavior.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ocr::TextBlock;

use super::ResolvedNames;

lazy_static! {
    static ref TITLED_BLOCK: Regex =
        Regex::new(r"^(?:นาย|นาง|นางสาว|น\.ส\.|เด็กชาย|เด็กหญิง)\s+[ก-๙a-zA-Z\s]+").unwrap();
    static ref TITLED_SPAN: Regex =
        Regex::new(r"((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]{3,}?)(?:\s*(?:บัญชี|พร้อมเพย์|\*)|\n|$)")
            .unwrap();
    static ref FULL_TITLED_BLOCK: Regex =
        Regex::new(r"^(?:นาย|นาง|นางสาว)\s+[ก-๙\s]+$").unwrap();
    static ref BARE_TITLE: Regex = Regex::new(r"^(?:นาย|นาง|นางสาว)$").unwrap();
    static ref NAME_CONTINUATION: Regex = Regex::new(r"^[ก-๙\s]{3,}$").unwrap();
}

/// Boilerplate disqualifying a block from the primary name scan.
const SCAN_NOISE: [&str; 5] = ["xxx", "บาท", "จำนวน", "ธนาคาร", "ธ.กสิกร"];

/// Keywords marking a candidate's context as the sending account.
const SENDER_CONTEXT: [&str; 2] = ["บัญชี", "ไอแบงก์"];

/// Keyword marking a candidate's context as the instant-transfer receiver.
const RECEIVER_CONTEXT: &str = "พร้อมเพย์";

/// Characters of surrounding text inspected on each side of a candidate.
const CONTEXT_WINDOW: usize = 150;

/// Resolver for bank-transfer slips.
#[derive(Debug, Clone)]
pub struct BankResolver {
    /// Minimum block confidence for the primary name scan.
    scan_threshold: f32,
    /// Minimum block confidence for the fallback block pass.
    fallback_threshold: f32,
}

impl Default for BankResolver {
    fn default() -> Self {
        Self {
            scan_threshold: 0.4,
            fallback_threshold: 0.85,
        }
    }
}

impl BankResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_threshold(mut self, threshold: f32) -> Self {
        self.scan_threshold = threshold;
        self
    }

    pub fn resolve(&self, text: &str, blocks: &[TextBlock]) -> ResolvedNames {
        // Pass 1: titled blocks in reading order.
        let scanned = self.scan_titled_blocks(blocks);
        match scanned.len() {
            0 => {}
            1 => {
                return ResolvedNames {
                    sender: Some(scanned[0].clone()),
                    ..Default::default()
                }
            }
            _ => {
                return ResolvedNames {
                    sender: Some(scanned[0].clone()),
                    receiver: Some(scanned[1].clone()),
                    ..Default::default()
                }
            }
        }

        // Pass 2: candidates from the full text plus high-confidence blocks,
        // attributed by surrounding context.
        let occurrences = self.collect_candidates(text, blocks);
        let mut distinct: Vec<String> = Vec::new();
        for name in &occurrences {
            if !distinct.contains(name) {
                distinct.push(name.clone());
            }
        }

        let mut sender = None;
        let mut receiver = None;

        for name in &distinct {
            match classify_by_context(text, name) {
                Some(Attribution::Sender) if sender.is_none() => sender = Some(name.clone()),
                Some(Attribution::Receiver) if receiver.is_none() => {
                    receiver = Some(name.clone())
                }
                _ => {}
            }
        }

        if distinct.len() >= 2 {
            if sender.is_none() {
                sender = Some(distinct[0].clone());
            }
            if receiver.is_none() {
                receiver = distinct.iter().find(|n| Some(*n) != sender.as_ref()).cloned();
            }
        }

        // Heuristic: exactly two identical spans read as a self-transfer.
        if receiver.is_none() && occurrences.len() == 2 && occurrences[0] == occurrences[1] {
            sender = Some(occurrences[0].clone());
            receiver = Some(occurrences[0].clone());
        } else if sender.is_none() && receiver.is_none() && distinct.len() == 1 {
            // Heuristic: a lone name is attributed to the sender.
            sender = Some(distinct[0].clone());
        }

        ResolvedNames {
            sender,
            receiver,
            ..Default::default()
        }
    }

    fn scan_titled_blocks(&self, blocks: &[TextBlock]) -> Vec<String> {
        blocks
            .iter()
            .filter(|b| b.confidence >= self.scan_threshold)
            .map(|b| b.text.trim())
            .filter(|t| TITLED_BLOCK.is_match(t))
            .filter(|t| {
                let lower = t.to_lowercase();
                !SCAN_NOISE.iter().any(|noise| lower.contains(noise))
            })
            .map(str::to_string)
            .collect()
    }

    /// Name candidates in document order: regex spans from the full text,
    /// then high-confidence titled blocks, reassembling a bare-title block
    /// with its continuation on the next line. Bare titles and one-word
    /// spans are discarded.
    fn collect_candidates(&self, text: &str, blocks: &[TextBlock]) -> Vec<String> {
        let mut names: Vec<String> = TITLED_SPAN
            .captures_iter(text)
            .map(|c| c[1].trim().to_string())
            .collect();

        for (i, block) in blocks.iter().enumerate() {
            if block.confidence < self.fallback_threshold {
                continue;
            }
            let span = block.text.trim();
            if FULL_TITLED_BLOCK.is_match(span) {
                if !names.iter().any(|n| n == span) {
                    names.push(span.to_string());
                }
            } else if BARE_TITLE.is_match(span) {
                if let Some(next) = blocks.get(i + 1) {
                    if next.confidence >= self.fallback_threshold
                        && NAME_CONTINUATION.is_match(next.text.trim())
                    {
                        let parts: Vec<&str> = next.text.split_whitespace().take(2).collect();
                        if parts.len() >= 2 {
                            let combined = format!("{span} {}", parts.join(" "));
                            if !names.contains(&combined) {
                                names.push(combined);
                            }
                        }
                    }
                }
            }
        }

        names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| n.split_whitespace().count() >= 2 && !BARE_TITLE.is_match(n))
            .collect()
    }
}

enum Attribution {
    Sender,
    Receiver,
}

/// Inspect the characters around the candidate's first occurrence; an
/// account keyword marks a sender, the instant-transfer keyword a receiver.
fn classify_by_context(text: &str, name: &str) -> Option<Attribution> {
    let position = text.find(name)?;

    // Exactly CONTEXT_WINDOW characters on each side, clipped at the text
    // bounds.
    let start = text[..position]
        .char_indices()
        .rev()
        .nth(CONTEXT_WINDOW - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end_target = position + name.len();
    let end = text[end_target..]
        .char_indices()
        .nth(CONTEXT_WINDOW)
        .map(|(i, _)| end_target + i)
        .unwrap_or(text.len());
    let context = text[start..end].to_lowercase();

    if SENDER_CONTEXT.iter().any(|k| context.contains(k)) {
        Some(Attribution::Sender)
    } else if context.contains(RECEIVER_CONTEXT) {
        Some(Attribution::Receiver)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn context_window_reaches_a_full_150_chars_back() {
        // Keyword ends exactly CONTEXT_WINDOW characters before the name.
        let name = "นาย สมชาย ใจดี";
        let text = format!("บัญชี{}{}", "x".repeat(CONTEXT_WINDOW - 5), name);
        assert!(matches!(
            classify_by_context(&text, name),
            Some(Attribution::Sender)
        ));

        // One character farther out falls off the window.
        let text = format!("บัญชี{}{}", "x".repeat(CONTEXT_WINDOW - 4), name);
        assert!(classify_by_context(&text, name).is_none());
    }

    #[test]
    fn titled_blocks_resolve_in_reading_order() {
        let blocks = vec![
            TextBlock::new("โอนเงินสำเร็จ", 0.9),
            TextBlock::new("นาย สมชาย ใจดี", 0.8),
            TextBlock::new("xxx-x-x1234-x", 0.7),
            TextBlock::new("นาง สมหญิง รักเรียน", 0.75),
        ];
        let names = BankResolver::new().resolve("", &blocks);
        assert_eq!(names.sender.as_deref(), Some("นาย สมชาย ใจดี"));
        assert_eq!(names.receiver.as_deref(), Some("นาง สมหญิง รักเรียน"));
    }

    #[test]
    fn single_titled_block_is_sender_only_heuristic() {
        let blocks = vec![TextBlock::new("นาย สมชาย ใจดี", 0.8)];
        let names = BankResolver::new().resolve("", &blocks);
        assert_eq!(names.sender.as_deref(), Some("นาย สมชาย ใจดี"));
        assert_eq!(names.receiver, None);
    }

    #[test]
    fn low_confidence_blocks_are_skipped_by_the_scan() {
        let blocks = vec![TextBlock::new("นาย สมชาย ใจดี", 0.2)];
        let names = BankResolver::new().resolve("", &blocks);
        assert_eq!(names.sender, None);
    }

    #[test]
    fn boilerplate_blocks_never_become_names() {
        let blocks = vec![
            TextBlock::new("นาย สมชาย จำนวนเงิน", 0.9),
            TextBlock::new("นาง สมหญิง รักเรียน", 0.9),
        ];
        let names = BankResolver::new().resolve("", &blocks);
        assert_eq!(names.sender.as_deref(), Some("นาง สมหญิง รักเรียน"));
        assert_eq!(names.receiver, None);
    }

    #[test]
    fn context_window_attributes_sender_and_receiver() {
        let text = "บัญชี ออมทรัพย์\nนาย สมชาย ใจดี\nโอนไปยัง พร้อมเพย์\nนาง สมหญิง รักเรียน\n";
        let names = BankResolver::new().resolve(text, &[]);
        assert_eq!(names.sender.as_deref(), Some("นาย สมชาย ใจดี"));
        assert_eq!(names.receiver.as_deref(), Some("นาง สมหญิง รักเรียน"));
    }

    #[test]
    fn two_identical_spans_resolve_as_self_transfer_heuristic() {
        let text = "นาย สมชาย ใจดี\nโอนเข้าบัญชีตัวเอง\nนาย สมชาย ใจดี\n";
        let names = BankResolver::new().resolve(text, &[]);
        assert_eq!(names.sender, names.receiver);
        assert_eq!(names.sender.as_deref(), Some("นาย สมชาย ใจดี"));
    }

    #[test]
    fn bare_title_block_is_reassembled_with_its_continuation() {
        let blocks = vec![
            TextBlock::new("นาง", 0.9),
            TextBlock::new("ยุพดี เจียมจรรยา", 0.9),
        ];
        let names = BankResolver::new().resolve("", &blocks);
        assert_eq!(names.sender.as_deref(), Some("นาง ยุพดี เจียมจรรยา"));
    }
}
