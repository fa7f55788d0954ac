use std::sync::OnceLock;

use chrono::{Datelike, Utc};
use regex::Regex;

use cardparse_core::config::ParseConfig;
use cardparse_core::normalize;
use cardparse_core::{Charge, ParseError};

use crate::provider::{BillingCycle, CardInfo, ProviderParser};
use crate::scan::{DateStyle, LineScanner};

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// "Opening/Closing Date 12/15/23 - 01/14/24"
re!(re_cycle,
    r"(?i)opening/closing date\s+(\d{1,2}/\d{1,2}/\d{2,4})\s*-\s*(\d{1,2}/\d{1,2}/\d{2,4})");
re!(re_masked_account, r"(?i)account number:?\s*(?:[x*]{4}[\s-]?){3}(\d{4})");
re!(re_ending_in, r"(?i)card ending in\s*(\d{4})");

/// Long phrases only: "chase" alone would fire on every "purchase".
const DETECT_KEYWORDS: &[&str] = &[
    "chase card services",
    "jpmorgan chase",
    "www.chase.com",
    "chase.com",
    "chase sapphire",
    "chase freedom",
    "chase slate",
];

/// Chase credit-card statements: bare `MM/DD` transaction dates, amounts
/// kept signed as printed. The transaction year comes from the statement
/// closing date when the header was found, else the configured fallback,
/// else the current year.
pub struct ChaseParser {
    config: ParseConfig,
}

impl ChaseParser {
    pub fn new(config: ParseConfig) -> Self {
        ChaseParser { config }
    }

    fn statement_year(&self, text: &str) -> i32 {
        self.extract_billing_cycle(text)
            .closed_on
            .map(|d| d.year())
            .or(self.config.fallback_year)
            .unwrap_or_else(|| Utc::now().date_naive().year())
    }
}

impl ProviderParser for ChaseParser {
    fn provider(&self) -> &'static str {
        "chase"
    }

    fn can_parse(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        DETECT_KEYWORDS.iter().any(|k| lower.contains(k))
            || re_masked_account().is_match(text)
    }

    fn extract_charges(&self, text: &str) -> Result<Vec<Charge>, ParseError> {
        let year = self.statement_year(text);
        let scanner = LineScanner::new(&self.config, DateStyle::MonthDay, year, true);
        Ok(scanner.scan(text.lines()))
    }

    fn extract_billing_cycle(&self, text: &str) -> BillingCycle {
        let Some(c) = re_cycle().captures(text) else {
            return BillingCycle::default();
        };
        BillingCycle {
            opened_on: normalize::parse_date(&c[1], None, None),
            closed_on: normalize::parse_date(&c[2], None, None),
        }
    }

    fn extract_card_info(&self, text: &str) -> CardInfo {
        let last4 = re_masked_account()
            .captures(text)
            .or_else(|| re_ending_in().captures(text))
            .map(|c| c[1].to_string());
        CardInfo { last4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str = "\
CHASE CARD SERVICES
Account Number: XXXX XXXX XXXX 4321
Opening/Closing Date 12/15/23 - 01/14/24

PURCHASES
12/18 AMAZON.COM AMZN.COM/BILL WA 123.45
12/20 PAYMENT THANK YOU -500.00
01/02 STARBUCKS STORE 08921 5.75
";

    fn parser() -> ChaseParser {
        ChaseParser::new(ParseConfig::default())
    }

    #[test]
    fn detects_canonical_headers_case_insensitive() {
        let p = parser();
        assert!(p.can_parse("Chase Card Services\nP.O. Box 15298"));
        assert!(p.can_parse("Manage your account at WWW.CHASE.COM"));
        assert!(p.can_parse("JPMorgan Chase Bank, N.A."));
    }

    #[test]
    fn detects_masked_account_without_brand_phrase() {
        let p = parser();
        // Redacted scans sometimes lose the letterhead; the labeled
        // masked account number is still a Chase-format signal.
        assert!(p.can_parse("Account Number: XXXX XXXX XXXX 4321\n12/18 AMAZON.COM 123.45"));
        assert!(p.can_parse("ACCOUNT NUMBER **** **** **** 4321"));
        // A bare account number without the masked groups is not enough.
        assert!(!p.can_parse("Account Number: 4321"));
    }

    #[test]
    fn does_not_false_positive_on_embedded_substrings() {
        let p = parser();
        assert!(!p.can_parse("PURCHASE 01/15 STORE 10.00"));
        assert!(!p.can_parse("Cash Advance APR 29.99%"));
        assert!(!p.can_parse("The chase is on"));
    }

    #[test]
    fn billing_cycle_from_header() {
        let cycle = parser().extract_billing_cycle(STATEMENT);
        assert_eq!(cycle.opened_on.unwrap().to_string(), "2023-12-15");
        assert_eq!(cycle.closed_on.unwrap().to_string(), "2024-01-14");
    }

    #[test]
    fn card_info_from_masked_account() {
        assert_eq!(parser().extract_card_info(STATEMENT).last4.as_deref(), Some("4321"));
        let info = parser().extract_card_info("Card ending in 9876");
        assert_eq!(info.last4.as_deref(), Some("9876"));
        assert_eq!(parser().extract_card_info("no digits here").last4, None);
    }

    #[test]
    fn charges_use_statement_year_and_keep_sign() {
        let charges = parser().extract_charges(STATEMENT).unwrap();
        // Payment line excluded.
        assert_eq!(charges.len(), 2);
        assert_eq!(charges[0].merchant, "AMAZON.COM AMZN.COM/BILL WA");
        assert_eq!(charges[0].amount.to_string(), "123.45");
        // Year taken from the closing date.
        assert_eq!(charges[0].date.to_string(), "2024-12-18");
        assert_eq!(charges[1].date.to_string(), "2024-01-02");
    }

    #[test]
    fn fallback_year_used_without_cycle_header() {
        let config = ParseConfig {
            fallback_year: Some(2022),
            ..ParseConfig::default()
        };
        let p = ChaseParser::new(config);
        let charges = p.extract_charges("01/15 CORNER STORE 12.00").unwrap();
        assert_eq!(charges[0].date.to_string(), "2022-01-15");
    }

    #[test]
    fn parse_composes_and_validates() {
        let result = parser().parse(STATEMENT).unwrap();
        assert_eq!(result.last4.as_deref(), Some("4321"));
        assert_eq!(result.statement_date.unwrap().to_string(), "2024-01-14");
        assert_eq!(result.charges.len(), 2);
    }

    #[test]
    fn parse_rejects_statement_without_last4() {
        let text = "\
CHASE CARD SERVICES
Opening/Closing Date 12/15/23 - 01/14/24
12/18 AMAZON.COM 123.45
";
        match parser().parse(text) {
            Err(ParseError::Incomplete { missing }) => assert_eq!(missing, vec!["last4"]),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
