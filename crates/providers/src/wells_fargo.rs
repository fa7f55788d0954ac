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

re!(re_closing_date, r"(?i)statement closing date:?\s*(\d{1,2}/\d{1,2}/\d{2,4})");
re!(re_period,
    r"(?i)statement period\s+(\d{1,2}/\d{1,2}/\d{4})\s+(?:to|through)\s+(\d{1,2}/\d{1,2}/\d{4})");
re!(re_ending_in, r"(?i)account ending in\s*(\d{4})");
re!(re_masked_account, r"(?i)(?:[x*]{4}[\s-]?){3}(\d{4})");

const DETECT_KEYWORDS: &[&str] = &["wells fargo"];

const SECTION_START: &str = "transaction summary";
const SECTION_END: &[&str] = &["fees charged", "interest charged"];

/// Wells Fargo credit-card statements: the transaction section sits
/// between the "TRANSACTION SUMMARY" header and the fee/interest
/// sections, rows print bare `MM/DD` dates, and amounts are stored as
/// absolute values. The statement closing date is extracted first and
/// its year applied to every transaction date.
pub struct WellsFargoParser {
    config: ParseConfig,
}

impl WellsFargoParser {
    pub fn new(config: ParseConfig) -> Self {
        WellsFargoParser { config }
    }

    fn statement_year(&self, text: &str) -> i32 {
        self.extract_billing_cycle(text)
            .closed_on
            .map(|d| d.year())
            .or(self.config.fallback_year)
            .unwrap_or_else(|| Utc::now().date_naive().year())
    }

    /// Lines of the transaction section; the whole text when the start
    /// marker is absent.
    fn transaction_section<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let lines: Vec<&str> = text.lines().collect();
        let start = lines
            .iter()
            .position(|l| l.to_lowercase().contains(SECTION_START));
        let body = match start {
            Some(idx) => &lines[idx + 1..],
            None => &lines[..],
        };
        let end = body.iter().position(|l| {
            let l = l.to_lowercase();
            SECTION_END.iter().any(|m| l.contains(m))
        });
        match end {
            Some(idx) => body[..idx].to_vec(),
            None => body.to_vec(),
        }
    }
}

impl ProviderParser for WellsFargoParser {
    fn provider(&self) -> &'static str {
        "wells_fargo"
    }

    fn can_parse(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        DETECT_KEYWORDS.iter().any(|k| text.contains(k))
    }

    fn extract_charges(&self, text: &str) -> Result<Vec<Charge>, ParseError> {
        let year = self.statement_year(text);
        let scanner = LineScanner::new(&self.config, DateStyle::MonthDay, year, false);
        Ok(scanner.scan(self.transaction_section(text).into_iter()))
    }

    fn extract_billing_cycle(&self, text: &str) -> BillingCycle {
        if let Some(c) = re_closing_date().captures(text) {
            return BillingCycle {
                opened_on: None,
                closed_on: normalize::parse_date(&c[1], None, None),
            };
        }
        if let Some(c) = re_period().captures(text) {
            return BillingCycle {
                opened_on: normalize::parse_date(&c[1], None, None),
                closed_on: normalize::parse_date(&c[2], None, None),
            };
        }
        BillingCycle::default()
    }

    fn extract_card_info(&self, text: &str) -> CardInfo {
        let last4 = re_ending_in()
            .captures(text)
            .or_else(|| re_masked_account().captures(text))
            .map(|c| c[1].to_string());
        CardInfo { last4 }
    }
}
