//! Numeric, date, and name canonicalization.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    static ref FOUR_DIGIT_YEAR: Regex = Regex::new(r"\d{4}").unwrap();
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^)]+\)").unwrap();
    static ref DIGIT_RUN: Regex = Regex::new(r"\d{4,}").unwrap();
    static ref TRAILING_NON_LETTER: Regex =
        Regex::new(r"[^\u{0e00}-\u{0e7f}a-zA-Z\s]+$").unwrap();
    static ref TRAILING_PUNCT: Regex = Regex::new(r"[.,:;]+$").unwrap();
    static ref BOILERPLATE: Regex = Regex::new(
        r"(?i)\b(?:บัญชีทรูมันนี่|จากวอลเล็ท|บัญชี|ทรูมันนี่|พร้อมเพย์|ธนาคาร|bank|วอลเล็ท|ออมสิน|ไอแบงก์|account|wallet|ออมทรัพย์|pomnipar)\b"
    )
    .unwrap();
}

/// Nouns marking a span as an organization rather than a person.
const ORG_KEYWORDS: [&str; 15] = [
    "มทร.",
    "บทร.",
    "โรงเรียน",
    "มหาวิทยาลัย",
    "วิทยาลัย",
    "สถาบัน",
    "ศูนย์",
    "องค์การ",
    "กรม",
    "กระทรวง",
    "เทศบาล",
    "บริษัท",
    "หจก",
    "บจก",
    "ศึกษา",
];

/// Normalize an amount candidate to a 2-decimal value.
///
/// Repairs OCR digit confusions (`o`/`O` for 0, `l`/`I`/`i` for 1) when the
/// token already looks numeric, resolves the thousands-vs-decimal comma
/// ambiguity, and rounds to 2 places. Unparsable input yields `None`, not
/// zero.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }

    let mut text = fix_ocr_digits(raw);

    if text.contains(',') && text.contains('.') {
        // Thai format: comma is a thousands separator
        text = text.replace(',', "");
    } else if text.contains(',') {
        // A lone comma is an OCR'd decimal point
        text = text.replace(',', ".");
    }

    let amount: Decimal = text.trim().parse().ok()?;
    Some(amount.round_dp(2))
}

/// Replace letter-for-digit OCR confusions, but only when the surrounding
/// token already carries a digit or decimal point.
fn fix_ocr_digits(text: &str) -> String {
    let digit_context = text.chars().any(|c| c.is_ascii_digit()) || text.contains('.');
    if !digit_context {
        return text.to_string();
    }

    text.chars()
        .map(|c| match c {
            'o' | 'O' => '0',
            'l' | 'I' | 'i' => '1',
            other => other,
        })
        .collect()
}

/// Rewrite a Buddhist-era 4-digit year (>= 2400) to Gregorian in place.
/// The rest of the date string is left untouched.
pub fn convert_buddhist_year(date: &str) -> String {
    if let Some(m) = FOUR_DIGIT_YEAR.find(date) {
        if let Ok(year) = m.as_str().parse::<i32>() {
            if year >= 2400 {
                let mut out = String::with_capacity(date.len());
                out.push_str(&date[..m.start()]);
                out.push_str(&(year - 543).to_string());
                out.push_str(&date[m.end()..]);
                return out;
            }
        }
    }
    date.to_string()
}

/// Clean an extracted name span of OCR artifacts.
///
/// Returns `None` for masked-account artifacts and for spans that do not
/// survive cleaning as a plausible name. Spans carrying a parenthetical are
/// treated as organization names and exempted from the person-name rules.
/// Applying the cleanup twice yields the same result as once.
pub fn clean_name(raw: &str) -> Option<String> {
    let mut name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    name = name
        .trim_matches(|c: char| matches!(c, '.' | ',' | ':' | '-'))
        .to_string();
    if name.is_empty() {
        return None;
    }

    let is_org_span = PARENTHETICAL.is_match(&name);

    if !is_org_span {
        let has_digit = name.chars().any(|c| c.is_numeric());
        let masked = (name.contains('*') && has_digit)
            || (name.to_lowercase().contains('x') && has_digit)
            || DIGIT_RUN.is_match(&name);
        if masked {
            return None;
        }
    }

    if !is_org_span && !ORG_KEYWORDS.iter().any(|k| name.contains(k)) {
        name = BOILERPLATE.replace_all(&name, "").to_string();
    }

    name = name.split_whitespace().collect::<Vec<_>>().join(" ");

    if !is_org_span {
        name = TRAILING_NON_LETTER.replace(&name, "").trim().to_string();
        if name.chars().count() < 2 || name.chars().any(|c| c.is_numeric()) {
            return None;
        }
    } else {
        name = TRAILING_PUNCT.replace(&name, "").trim().to_string();
        if name.chars().count() < 3 {
            return None;
        }
    }

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
