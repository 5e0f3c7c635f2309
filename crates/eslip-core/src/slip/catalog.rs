//! Declarative rule catalogue for Thai slip extraction.
//!
//! The catalogue is pure data: per-field ordered pattern lists, an ordered
//! brand lookup table, and merchant name patterns. Consumers iterate the
//! lists generically; adding, removing, or reordering rules requires no code
//! changes elsewhere. A catalogue is built once and shared read-only across
//! concurrent pipelines.

use std::collections::BTreeMap;

use regex::Regex;

use crate::models::receipt::{Field, RailType};

/// One extraction rule. Priority is the rule's position in its field list;
/// earlier rules are trusted more.
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// Compiled pattern, case-insensitive and multi-line.
    pub pattern: Regex,
}

impl FieldRule {
    /// Compile a rule pattern. `(?im)` flags are applied to every rule.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("(?im){pattern}"))?,
        })
    }
}

/// A brand keyword mapping to a payment rail and brand name.
#[derive(Debug, Clone)]
pub struct BrandRule {
    /// Uppercased keyword matched as a substring of the uppercased document.
    pub keyword: String,
    /// Rail type of the brand.
    pub rail: RailType,
    /// Canonical brand name.
    pub brand: String,
}

impl BrandRule {
    pub fn new(keyword: &str, rail: RailType, brand: &str) -> Self {
        Self {
            keyword: keyword.to_uppercase(),
            rail,
            brand: brand.to_string(),
        }
    }
}

/// Ordered, immutable rule configuration for one deployment.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    fields: BTreeMap<Field, Vec<FieldRule>>,
    brands: Vec<BrandRule>,
    merchants: Vec<Regex>,
}

impl RuleCatalog {
    /// Build a catalogue from explicit rule lists.
    pub fn new(
        fields: BTreeMap<Field, Vec<FieldRule>>,
        brands: Vec<BrandRule>,
        merchants: Vec<Regex>,
    ) -> Self {
        Self {
            fields,
            brands,
            merchants,
        }
    }

    /// The ordered rule list for a field, highest priority first.
    pub fn rules_for(&self, field: Field) -> &[FieldRule] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First brand keyword found in the document, in table-declaration order.
    ///
    /// Case-insensitive substring match over the whole document.
    pub fn detect_brand(&self, full_text: &str) -> Option<&BrandRule> {
        let upper = full_text.to_uppercase();
        self.brands.iter().find(|rule| upper.contains(&rule.keyword))
    }

    /// Merchant/business name patterns, in priority order.
    pub fn merchant_rules(&self) -> &[Regex] {
        &self.merchants
    }

    /// The stock catalogue for Thai payment slips and e-slips.
    pub fn thai() -> Self {
        let mut fields = BTreeMap::new();

        fields.insert(
            Field::Amount,
            compile(&[
                r"(?:ยอดรวม|รวม|total|amount)\s*:?\s*(\d+[.,]\d{2})",
                r"(?:จำนวนเงิน).*?(\d{1,3}(?:,\d{3})*\.?\d{2})",
                r"(\d{1,3}(?:,\d{3})*\.?\d{2})\s*บาท",
                r"(\d+[.,]\d{2})\s*(?:บาท|THB|baht)",
                r"(?:ยอด|total).*?(\d+\.\d{2})",
                r"จำนวนเงิน\s*[^\d]*(\d{1,3}(?:,\d{3})*\.?\d{2})",
                // Thousands-separated transfers: 3,000.00
                r"(\d{1,3},\d{3}\.\d{2})",
                // OCR misreads: ฿ seen as 'b', digits seen as letters
                r"(?:b|฿)\s*([1lioO0]+[.,]\d{2})",
                r"(?:b|฿)\s*(\d+[.,]\d{2})",
                r"([1lioO0]+[oO0][.,]\d{2})",
                r"(\d+[oO][.,]\d{2})",
            ]),
        );

        fields.insert(
            Field::Fee,
            compile(&[
                r"(?:ค่าธรรมเนียม|fee|charge).*?(\d+[.,]\d{2})",
                r"(?:service|transaction)\s*fee.*?(\d+[.,]\d{2})",
                // OCR reads a zero fee as "o.00"
                r"ค่าธรรมเนียม[^\d]*([o0]\.\d{2})",
                r"ค่าธรรมเนียม[^\d]*(\d+\.\d{2})",
            ]),
        );

        fields.insert(
            Field::ReferenceId,
            compile(&[
                r"(?:เลขที่รายการ|reference|ref#?|tid|r#|รหัสอ้างอิง)\s*:?\s*([A-Za-z0-9]+)",
                // Mobile-bank format: 12 digits + 3+ alphanumeric + digits
                r"(\d{12}[A-Za-z0-9]{3,}\d+)",
                r"(\d{10,}[A-Za-z0-9]+)",
                r"(?:transaction|ref)\s*id.*?([A-Za-z0-9]+)",
                r"(?:หมายเลข|รหัส).*?([A-Za-z0-9]{8,})",
                r"([A-Za-z]{3}\d{8,})",
                r"(\d{10,}:\s*[A-Z0-9]+)",
            ]),
        );

        fields.insert(
            Field::Date,
            compile(&[
                r"(\d{1,2}/\d{1,2}/\d{2,4})(?:\s*[|\s]\s*(\d{1,2}:\d{2}))?",
                r"(\d{1,2}-\d{1,2}-\d{2,4})(?:\s*[|\s]\s*(\d{1,2}:\d{2}))?",
                r"(\d{2,4}/\d{1,2}/\d{1,2})(?:\s*[|\s]\s*(\d{1,2}:\d{2}))?",
                r"(\d{1,2}\s+(?:ม\.ค\.|ก\.พ\.|มี\.ค\.|เม\.ย\.|พ\.ค\.|มิ\.ย\.|ก\.ค\.|ส\.ค\.|ก\.ย\.|ต\.ค\.|พ\.ย\.|ธ\.ค\.)\s+\d{4})",
                // Abbreviated Thai month with two-digit Buddhist year: "31 ส.ค. 68 14:50"
                r"(\d{1,2}\s+ส\.ค\.\s+\d{2,4}(?:\s+\d{1,2}:\d{2})?)",
                r"(\d{1,2}\s+[ก-๙]{1,3}\.?[ก-๙]{1,3}\.?\s+\d{2,4}(?:\s+\d{1,2}:\d{2})?)",
                r"(\d{1,2}:\d{2})",
            ]),
        );

        fields.insert(
            Field::SenderName,
            compile(&[
                // Honorific-prefixed name after "จาก"; stop before rail boilerplate
                r"จาก[^\n]*?((?:นาย|นาง|นางสาว|เด็กชาย|เด็กหญิง)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|ธนาคาร|bank|\n|$)",
                r"ผู้โอน[:\s]*((?:นาย|นาง|นางสาว|เด็กชาย|เด็กหญิง)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|ธนาคาร|bank|\n|$)",
                r"ส่งเงินจาก[:\s]*((?:นาย|นาง|นางสาว|เด็กชาย|เด็กหญิง)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|ธนาคาร|bank|\n|$)",
                // Names adjacent to account labels on bank slips
                r"((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]{3,}?)\s*(?:บัญชี|ไอแบงก์)",
                // Bare name after "จาก"
                r"จาก[^\n]*?([ก-๙a-zA-Z\s]{3,})\s*(?:บัญชี|ธนาคาร|bank|\n|$)",
                // Mobile-bank transfer: first name after the success banner
                r"โอนเงินสำเร็จ[^ก-๙]*?([ก-๙a-zA-Z\s]{3,}?)(?:\s*xxx|$)",
                // Wallet transfers: sender sits before the wallet account phrase
                r"จากวอลเล็ท\s+([ก-๙a-zA-Z\s]+?\s+[ก-๙a-zA-Z\s]{2,}?)\s*บัญชีทรูมันนี่",
                r"^((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:บัญชี|ธนาคาร|bank|\n)",
                // OCR split the honorific and the name across lines
                r"((?:นาย|นาง|นางสาว)\s*\n\s*[ก-๙a-zA-Z\s]{2,})",
            ]),
        );

        fields.insert(
            Field::ReceiverName,
            compile(&[
                // Institutions with a parenthetical note, highest specificity
                r"(มทร\.\s*[ก-๙a-zA-Z\s]*)\s*\(\s*([ก-๙a-zA-Z\s]*)\s*\)",
                r"((?:มหาวิทยาลัย|มทร\.|บทร\.|มข\.|มอ\.|ม\.)[ก-๙a-zA-Z\s\.]*)\s*\([^)]+\)",
                // Organizations keyed on institutional nouns
                r"([ก-๙a-zA-Z\s\.]+(?:โรงเรียน|มหาวิทยาลัย|วิทยาลัย|สถาบัน|ศูนย์|องค์การ|กรม|กระทรวง|เทศบาล|องค์การบริหาร|สำนัก)[ก-๙a-zA-Z\s\(\)\.]*?)(?:\s*\d{5,}|\s*พร้อมเพย์|\n|$)",
                r"((?:บริษัท|ห้างหุ้นส่วน|หจก\.|บจก\.)[ก-๙a-zA-Z\s\(\)\.]+?)(?:\s*\d{5,}|\s*พร้อมเพย์|\n|$)",
                r"([ก-๙a-zA-Z\s]+\s*\([ก-๙a-zA-Z\s]+\))(?:\s*\d{5,}|\s*\d{10,}|\s*พร้อมเพย์|\n|$)",
                // Explicit "ถึง"/"ผู้รับ" context with an honorific
                r"ถึง\s*[:\-]?\s*((?:นาย|นาง|นางสาว|น\.ส\.|ด\.ช\.|ด\.ญ\.)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|ธนาคาร|เบอร์|xxx|\*|\d{10}|\n|$)",
                r"ถึง\s*[:\-]?\s*\n\s*((?:นาย|นาง|นางสาว|น\.ส\.)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|\n|$)",
                r"ผู้รับ\s*[:\-]?\s*((?:นาย|นาง|นางสาว|น\.ส\.)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|ธนาคาร|\n|$)",
                r"รับเงิน(?:ที่|จาก)?\s*[:\-]?\s*((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|\n|$)",
                r"ถึง\s*[:\-]?\s*([ก-๙a-zA-Z\s]{3,}?)\s*(?:พร้อมเพย์|บัญชี|ธนาคาร|\d{10}|\n|$)",
                // PromptPay slips: name follows the rail keyword
                r"พร้อมเพย์\s*[:\-]?\s*(?:\d{10})?\s*\n?\s*((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]{3,}?)\s*(?:xxx|\*|\n|$)",
                r"พร้อมเพย์[^\n]*\n[^\n]*?((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]{3,}?)\s*(?:พร้อมเพย์|xxx|\n|$)",
                r"(?:พร้อมเพย์.*?\n.*?)((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]+?)\s*(?:xxx|\*|\d{10}|\n|$)",
                // Masked-account transfers: name after "xxx"
                r"xxx[^ก-๙]*?([ก-๙a-zA-Z\s]{3,}?)(?:\s*(?:xxx|บัญชี|พร้อมเพย์)|$)",
                // Position-based: after a 10-digit account/phone number
                r"\d{10}\s*\n?\s*((?:นาย|นาง|นางสาว)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:พร้อมเพย์|บัญชี|\n|$)",
                r"(?:บัญชี|account)\s*[:\-]?\s*([ก-๙a-zA-Z\s]{3,}?)(?:\s*\d{5,}|\s*พร้อมเพย์|\n|$)",
                // Generic honorific-prefixed fallbacks
                r"((?:นาย|นาง|นางสาว|น\.ส\.)\s+[ก-๙a-zA-Z\s]{2,}?)\s*(?:บัญชี|ธนาคาร|bank|พร้อมเพย์|xxx|\*|\d{10}|\n|$)",
                r"(?:นาย|นาง|นางสาว)\s*\n\s*([ก-๙a-zA-Z\s]{2,}?)\s*(?:บัญชี|พร้อมเพย์|\n|$)",
                r"\b([ก-๙]{2,}\s+[ก-๙]{2,}(?:\s+[ก-๙]{2,})?)\s*(?:พร้อมเพย์|บัญชี|xxx|\d{10}|\n|$)",
            ]),
        );

        let brands = vec![
            // Banks, all grouped under "Bank"
            BrandRule::new("K PLUS", RailType::Bank, "Bank"),
            BrandRule::new("K+", RailType::Bank, "Bank"),
            BrandRule::new("กสิกรไทย", RailType::Bank, "Bank"),
            BrandRule::new("KBANK", RailType::Bank, "Bank"),
            BrandRule::new("KASIKORN", RailType::Bank, "Bank"),
            BrandRule::new("SCB", RailType::Bank, "Bank"),
            BrandRule::new("ไทยพาณิชย์", RailType::Bank, "Bank"),
            BrandRule::new("BBL", RailType::Bank, "Bank"),
            BrandRule::new("กรุงเทพ", RailType::Bank, "Bank"),
            BrandRule::new("KTB", RailType::Bank, "Bank"),
            BrandRule::new("กรุงไทย", RailType::Bank, "Bank"),
            BrandRule::new("TMB", RailType::Bank, "Bank"),
            BrandRule::new("ทหารไทย", RailType::Bank, "Bank"),
            BrandRule::new("UOB", RailType::Bank, "Bank"),
            BrandRule::new("CIMB", RailType::Bank, "Bank"),
            BrandRule::new("BANK", RailType::Bank, "Bank"),
            // Retail
            BrandRule::new("7-ELEVEN", RailType::Retail, "7-Eleven"),
            BrandRule::new("7-ELEVE", RailType::Retail, "7-Eleven"),
            BrandRule::new("7-ELEVEท", RailType::Retail, "7-Eleven"),
            BrandRule::new("เซเว่น", RailType::Retail, "7-Eleven"),
            BrandRule::new("CP", RailType::Retail, "CP"),
            BrandRule::new("เซ็นทรัล", RailType::Retail, "Central"),
            BrandRule::new("โลตัส", RailType::Retail, "Lotus"),
            BrandRule::new("บิ๊กซี", RailType::Retail, "Big C"),
            BrandRule::new("แม็คโคร", RailType::Retail, "Makro"),
            // E-wallets and payment apps
            BrandRule::new("TRUE WALLET", RailType::EWallet, "TrueMoney"),
            BrandRule::new("TRUEMONEY", RailType::EWallet, "TrueMoney"),
            BrandRule::new("RABBIT LINE PAY", RailType::EWallet, "Rabbit LINE Pay"),
            BrandRule::new("SHOPEE PAY", RailType::EWallet, "ShopeePay"),
            BrandRule::new("PROMPTPAY", RailType::EWallet, "PromptPay"),
            BrandRule::new("มายมอ", RailType::EWallet, "MyMo"),
            BrandRule::new("รายการสำเร็จ", RailType::EWallet, "PromptPay"),
            BrandRule::new("กำรายการสำเร็จ", RailType::EWallet, "PromptPay"),
            BrandRule::new("รายการโอนเงิน", RailType::EWallet, "PromptPay"),
            BrandRule::new("พร้อมเพย์", RailType::EWallet, "PromptPay"),
            // Services
            BrandRule::new("GRAB", RailType::RideHailing, "Grab"),
            BrandRule::new("แกร็บ", RailType::RideHailing, "Grab"),
            BrandRule::new("FOODPANDA", RailType::FoodDelivery, "foodpanda"),
        ];

        let merchants = compile_raw(&[
            r"สาขา\s+([^:\n\r]+)",
            r"(?:ร้าน|shop|store)\s*:?\s*([^\n\r]+)",
            r"(?:merchant|ผู้ขาย)\s*:?\s*([^\n\r]+)",
            r"^([A-Z\s]{3,20})(?:ที่|@|location)",
            r"รหัสร้าน\s*:\s*(\d+)",
            r"(บจก\.\s*[^\n\r]+)",
            r"([ก-๙a-zA-Z\s]+(?:โรสเตอร์|คอฟฟี่|ร้าน|เซ็นเตอร์))",
        ]);

        Self::new(fields, brands, merchants)
    }
}

fn compile(patterns: &[&str]) -> Vec<FieldRule> {
    patterns
        .iter()
        .map(|p| FieldRule::new(p).expect("invalid catalogue pattern"))
        .collect()
}

fn compile_raw(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?im){p}")).expect("invalid merchant pattern"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stock_catalogue_has_rules_for_every_extracted_field() {
        let catalog = RuleCatalog::thai();
        for field in [
            Field::Date,
            Field::Amount,
            Field::Fee,
            Field::ReferenceId,
            Field::SenderName,
            Field::ReceiverName,
        ] {
            assert!(!catalog.rules_for(field).is_empty(), "no rules for {field}");
        }
        // Merchant has no pattern list; it is detected separately.
        assert!(catalog.rules_for(Field::Merchant).is_empty());
    }

    #[test]
    fn brand_detection_is_declaration_ordered_and_case_insensitive() {
        let catalog = RuleCatalog::thai();

        let rule = catalog.detect_brand("โอนผ่าน k plus สำเร็จ").unwrap();
        assert_eq!(rule.rail, RailType::Bank);
        assert_eq!(rule.brand, "Bank");

        // "KBANK" also contains "BANK"; the earlier declaration wins.
        let rule = catalog.detect_brand("KBANK transfer").unwrap();
        assert_eq!(rule.keyword, "KBANK");

        assert!(catalog.detect_brand("ร้านข้าวมันไก่").is_none());
    }

    #[test]
    fn alternate_catalogue_overrides_stock_rules() {
        let mut fields = BTreeMap::new();
        fields.insert(
            Field::Amount,
            vec![FieldRule::new(r"TOTAL\s+(\d+\.\d{2})").unwrap()],
        );
        let brands = vec![BrandRule::new("TESTPAY", RailType::EWallet, "TestPay")];
        let catalog = RuleCatalog::new(fields, brands, Vec::new());

        assert_eq!(catalog.rules_for(Field::Amount).len(), 1);
        assert!(catalog.rules_for(Field::Date).is_empty());
        assert_eq!(catalog.detect_brand("testpay slip").unwrap().brand, "TestPay");
    }

    #[test]
    fn wallet_marker_maps_to_promptpay_not_bank() {
        let catalog = RuleCatalog::thai();
        let rule = catalog.detect_brand("พร้อมเพย์ 0812345678").unwrap();
        assert_eq!(rule.rail, RailType::EWallet);
        assert_eq!(rule.brand, "PromptPay");
    }
}
