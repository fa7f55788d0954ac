use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use cardparse_core::config::ParseConfig;
use cardparse_core::normalize::{self, MerchantCleanup};
use cardparse_core::{Charge, StatementParseResult};

use crate::classifier::{ChargeClassifier, ClassifyError};
use crate::dispatch::EngineError;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_amountish, r"\$\s*\d+|\b\d+\.\d{2}\b");
re!(re_dateish, r"\b\d{1,2}/\d{1,2}\b|\b\d{4}-\d{2}-\d{2}\b");
re!(re_last4_labeled, r"(?i)(?:ending in|account number:?)\D{0,20}(\d{4})\b");
re!(re_last4_masked, r"(?i)[x*]{4}[\s-]*(\d{4})\b");
re!(re_full_date, r"\b(\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2})\b");

/// Provider-agnostic parser that delegates extraction to an external
/// text classifier instead of regex scanning, then forces the
/// collaborator's output through the same validation and payment-filter
/// rules as the deterministic parsers.
pub struct GenericParser<C: ChargeClassifier> {
    config: ParseConfig,
    classifier: C,
}

impl<C: ChargeClassifier> GenericParser<C> {
    pub fn new(config: ParseConfig, classifier: C) -> Self {
        GenericParser { config, classifier }
    }

    /// Loose "maybe a statement" heuristic: any dollar amount or
    /// date-like substring.
    pub fn looks_like_statement(&self, text: &str) -> bool {
        re_amountish().is_match(text) || re_dateish().is_match(text)
    }

    pub async fn parse(&self, text: &str) -> Result<StatementParseResult, EngineError> {
        let payload = self.classifier.classify(text).await?;
        let entries = payload.as_array().ok_or(ClassifyError::NotAnArray)?;
        debug!(entries = entries.len(), "classifier payload received");

        let statement_date = self.loose_statement_date(text);
        let charges: Vec<Charge> = entries
            .iter()
            .filter_map(|entry| self.charge_from_entry(entry, statement_date))
            .collect();

        let result = StatementParseResult {
            last4: loose_last4(text),
            statement_date,
            charges,
        };
        Ok(result.into_validated()?)
    }

    /// The payload is an untrusted schema: every field is type-checked
    /// and coerced, and entries that fail the shared per-line rules are
    /// dropped, not fatal.
    fn charge_from_entry(&self, entry: &Value, statement_date: Option<NaiveDate>) -> Option<Charge> {
        if !normalize::required_fields_present(entry, &["merchant", "amount"]) {
            return None;
        }

        let merchant = normalize::clean_merchant(
            entry.get("merchant")?.as_str()?,
            &MerchantCleanup::default(),
        );
        if merchant.len() < 2 || self.config.is_payment(&merchant) {
            return None;
        }

        let amount = match entry.get("amount")? {
            Value::Number(n) => {
                let f = n.as_f64().filter(|f| f.is_finite())?;
                Decimal::from_f64(f)?
            }
            Value::String(s) => normalize::parse_amount_opt(s)?,
            _ => return None,
        };
        if amount.is_zero() {
            return None;
        }

        // Dates may come back null or unparseable; fall back to the
        // statement date, else drop the entry.
        let date = entry
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| normalize::parse_date(s, None, Some(self.default_year(statement_date))))
            .or(statement_date)?;

        let mut charge = Charge::new(merchant, amount, date);
        charge.allocated_to = entry
            .get("allocated_to")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Some(charge)
    }

    fn default_year(&self, statement_date: Option<NaiveDate>) -> i32 {
        statement_date
            .map(|d| d.year())
            .or(self.config.fallback_year)
            .unwrap_or_else(|| Utc::now().date_naive().year())
    }

    fn loose_statement_date(&self, text: &str) -> Option<NaiveDate> {
        let c = re_full_date().captures(text)?;
        normalize::parse_date(&c[1], None, None)
    }
}

fn loose_last4(text: &str) -> Option<String> {
    re_last4_labeled()
        .captures(text)
        .or_else(|| re_last4_masked().captures(text))
        .map(|c| c[1].to_string())
}
