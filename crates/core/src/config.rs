use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Keyword lists and scan limits shared by every parser.
///
/// Built once at startup and injected; parsers keep a copy and stay
/// immutable afterwards, so instances can be shared across concurrent
/// parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Merchant substrings that mark a payment *to* the card.
    pub payment_keywords: Vec<String>,
    /// Currency names that open a foreign-currency continuation block.
    pub currency_keywords: Vec<String>,
    /// Merchant substrings that make a flight-detail probe worthwhile.
    pub airline_keywords: Vec<String>,
    /// Merchant substrings whose raw source line is kept on the charge.
    pub capture_keywords: Vec<String>,
    /// How many lines past a transaction are inspected for continuations.
    pub lookahead_window: usize,
    /// Year for bare `MM/DD` dates when the statement itself has none.
    /// Left unset, the current year is used.
    pub fallback_year: Option<i32>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            payment_keywords: to_strings(&[
                "payment thank you",
                "online payment",
                "autopay",
                "automatic payment",
                "payment received",
            ]),
            currency_keywords: to_strings(&[
                "krone", "krona", "euro", "pound", "sterling", "yen", "yuan", "peso", "franc",
                "rupee", "won", "zloty", "real", "rand",
            ]),
            airline_keywords: to_strings(&[
                "airline", "airlines", "airways", "delta", "united", "southwest",
                "jetblue", "alaska air", "lufthansa", "klm", "ryanair",
            ]),
            capture_keywords: to_strings(&[
                "amazon", "amzn", "ebay", "etsy", "walmart.com", "mktp",
            ]),
            lookahead_window: 4,
            fallback_year: None,
        }
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl ParseConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ParseError> {
        toml::from_str(toml_content).map_err(|e| ParseError::Config(e.to_string()))
    }

    pub fn is_payment(&self, merchant: &str) -> bool {
        contains_any(merchant, &self.payment_keywords)
    }

    pub fn is_airline(&self, merchant: &str) -> bool {
        // "air" only counts as a whole word: "AIR FRANCE" qualifies,
        // "FAIR PRICE MARKET" does not.
        merchant
            .to_lowercase()
            .split_whitespace()
            .any(|w| w == "air")
            || contains_any(merchant, &self.airline_keywords)
    }

    pub fn currency_keyword_in(&self, line: &str) -> bool {
        contains_any(line, &self.currency_keywords)
    }

    pub fn should_capture(&self, merchant: &str) -> bool {
        contains_any(merchant, &self.capture_keywords)
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k.as_str()))
}
