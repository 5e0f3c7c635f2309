//! Wallet-transfer name resolution.
//!
//! Wallet slips list the sender account above the marker phrase
//! "จากวอลเล็ท" and the receiver account below it, each next to the wallet
//! account phrase "บัญชีทรูมันนี่". The structural extraction runs first; a
//! keyword-adjacency fallback covers slips where OCR mangled the layout.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ocr::TextBlock;

use super::ResolvedNames;

/// Marker phrase separating the sender half from the receiver half.
pub const WALLET_MARKER: &str = "จากวอลเล็ท";

/// Label printed next to each wallet account number.
const ACCOUNT_PHRASE: &str = "บัญชีทรูมันนี่";

lazy_static! {
    // Sender: name segment directly before the account phrase that is
    // followed (anywhere below) by the marker.
    static ref SENDER: Regex = Regex::new(&format!(
        r"(?si)([ก-๙a-zA-Z\s\*]{{3,}}?)\s+{ACCOUNT_PHRASE}.*?{WALLET_MARKER}"
    ))
    .unwrap();
    // Receiver: name segment directly after the marker.
    static ref RECEIVER: Regex = Regex::new(&format!(
        r"(?si){WALLET_MARKER}\s*([ก-๙a-zA-Z\s]{{3,}}?)(?:\s*{ACCOUNT_PHRASE}|$)"
    ))
    .unwrap();
    // Any name-like span adjacent to the account phrase.
    static ref NEAR_ACCOUNT: Regex = Regex::new(&format!(
        r"(?i)([ก-๙a-zA-Z\s\*]{{3,}}?)\s*{ACCOUNT_PHRASE}"
    ))
    .unwrap();
    static ref NAME_SPAN: Regex = Regex::new(r"([ก-๙a-zA-Z\s]{3,}?)(?:\s|$)").unwrap();
}

/// Boilerplate that disqualifies a span from being a sender name.
const SENDER_NOISE: [&str; 4] = ["วอลเล็ท", "ทรูมันนี่", "บัญชี", "truemoney"];

/// Terms that disqualify a span in the receiver half.
const RECEIVER_NOISE: [&str; 4] = ["บัญชี", "ทรู", "มันนี่", "วันที่"];

/// Resolver for wallet-transfer slips.
#[derive(Debug, Clone, Default)]
pub struct WalletResolver;

impl WalletResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, text: &str, _blocks: &[TextBlock]) -> ResolvedNames {
        let mut sender = SENDER
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty());
        let mut receiver = RECEIVER
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .filter(|s| !s.is_empty());

        if sender.is_none() || receiver.is_none() {
            if sender.is_none() {
                sender = self.fallback_sender(text);
            }
            if receiver.is_none() {
                receiver = self.fallback_receiver(text);
            }
        }

        ResolvedNames {
            sender,
            receiver,
            ..Default::default()
        }
    }

    /// First clean span adjacent to the wallet account phrase.
    fn fallback_sender(&self, text: &str) -> Option<String> {
        NEAR_ACCOUNT
            .captures_iter(text)
            .map(|c| c[1].trim().to_string())
            .find(|span| {
                span.chars().count() > 2
                    && !SENDER_NOISE
                        .iter()
                        .any(|t| span.to_lowercase().contains(t))
            })
    }

    /// First clean span in the half of the document after the marker.
    fn fallback_receiver(&self, text: &str) -> Option<String> {
        let after_marker = text.split(WALLET_MARKER).nth(1)?;
        NAME_SPAN
            .captures_iter(after_marker)
            .map(|c| c[1].trim().to_string())
            .find(|span| {
                span.chars().count() > 2
                    && !RECEIVER_NOISE
                        .iter()
                        .any(|t| span.to_lowercase().contains(t))
            })
    }
}
