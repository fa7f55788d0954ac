//! Shared line scanner used by the deterministic provider parsers.
//!
//! A transaction line is recognized by splitting on whitespace and
//! checking the leading date token and the trailing amount token against
//! small anchored patterns. A single greedy date+merchant+amount regex
//! would be vulnerable to catastrophic backtracking on adversarial
//! statements, so the suffix check stays deliberately token-based.

use std::sync::OnceLock;

use regex::Regex;

use cardparse_core::config::ParseConfig;
use cardparse_core::normalize::{self, MerchantCleanup};
use cardparse_core::{Charge, FlightDetails};

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_token_month_day, r"^\d{1,2}/\d{1,2}$");
re!(re_token_month_day_year, r"^\d{1,2}/\d{1,2}/\d{2,4}$");
re!(re_token_amount, r"^\(?-?\$?[\d,]+\.\d{2}\)?$");

// `15.50 X 6.45` — foreign amount times conversion rate.
re!(re_conversion_rate, r"(?i)^(\d+(?:\.\d+)?)\s*X\s*(\d+(?:\.\d+)?)$");
// Currency-name lines print as uppercase letters and spaces only.
re!(re_all_caps_words, r"^[A-Z][A-Z ]{2,}$");

// `LAX/JFK`, `LAX-JFK`, `LAX JFK`
re!(re_airport_pair, r"^([A-Z]{3})[/ -]([A-Z]{3})$");
// Six bare letters, two airport codes run together.
re!(re_airport_run, r"^([A-Z]{3})([A-Z]{3})$");
// E-ticket numbers are 13 digits.
re!(re_ticket_number, r"^\d{13}$");

/// Which date token shape a provider prints on transaction lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateStyle {
    /// Bare `MM/DD`; the year comes from the scanner.
    MonthDay,
    /// `MM/DD/YYYY` or `MM/DD/YY`.
    MonthDayYear,
}

impl DateStyle {
    fn token_matches(self, token: &str) -> bool {
        match self {
            DateStyle::MonthDay => re_token_month_day().is_match(token),
            DateStyle::MonthDayYear => re_token_month_day_year().is_match(token),
        }
    }
}

struct TxLine<'l> {
    date_token: &'l str,
    merchant: String,
    amount_token: &'l str,
    raw: &'l str,
}

/// One pass over a statement's lines, bounded lookahead included.
pub(crate) struct LineScanner<'c> {
    config: &'c ParseConfig,
    style: DateStyle,
    year: i32,
    /// Keep the printed sign (Chase) or store the absolute value
    /// (Wells Fargo).
    keep_sign: bool,
}

impl<'c> LineScanner<'c> {
    pub(crate) fn new(config: &'c ParseConfig, style: DateStyle, year: i32, keep_sign: bool) -> Self {
        LineScanner {
            config,
            style,
            year,
            keep_sign,
        }
    }

    /// Scan trimmed, non-empty lines in order. Every line is visited once
    /// by the main scan; lookahead reads ahead without consuming.
    pub(crate) fn scan<'l>(&self, lines: impl Iterator<Item = &'l str>) -> Vec<Charge> {
        let lines: Vec<&str> = lines.map(str::trim).filter(|l| !l.is_empty()).collect();
        let mut charges = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let Some(charge) = self.charge_from_line(line) else {
                continue;
            };
            let mut charge = charge;
            self.lookahead(&lines[idx + 1..], &mut charge);
            charges.push(charge);
        }

        charges
    }

    fn split_line<'l>(&self, line: &'l str) -> Option<TxLine<'l>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            return None;
        }
        let date_token = tokens[0];
        let amount_token = tokens[tokens.len() - 1];
        if !self.style.token_matches(date_token) || !re_token_amount().is_match(amount_token) {
            return None;
        }
        Some(TxLine {
            date_token,
            merchant: tokens[1..tokens.len() - 1].join(" "),
            amount_token,
            raw: line,
        })
    }

    fn is_transaction_line(&self, line: &str) -> bool {
        self.split_line(line).is_some()
    }

    /// Per-line failures are skips, never fatal: a bad date, a zero or
    /// unparseable amount, a merchant shorter than two characters, or a
    /// payment-keyword hit all drop the line and move on.
    fn charge_from_line(&self, line: &str) -> Option<Charge> {
        let tx = self.split_line(line)?;

        let date = normalize::parse_date(tx.date_token, None, Some(self.year))?;

        let mut amount = normalize::parse_amount_opt(tx.amount_token)?;
        if amount.is_zero() {
            return None;
        }
        if !self.keep_sign {
            amount = amount.abs();
        }

        let merchant = normalize::clean_merchant(&tx.merchant, &MerchantCleanup::default());
        if merchant.len() < 2 {
            return None;
        }
        if self.config.is_payment(&merchant) {
            return None;
        }

        let mut charge = Charge::new(merchant, amount, date);
        if self.config.should_capture(&charge.merchant) {
            charge.full_statement_text = Some(tx.raw.to_string());
        }
        Some(charge)
    }

    /// Inspect up to `lookahead_window` following lines for continuation
    /// blocks, stopping early at the next transaction line so enrichment
    /// never crosses a transaction boundary.
    fn lookahead(&self, rest: &[&str], charge: &mut Charge) {
        let probe_flight = self.config.is_airline(&charge.merchant);
        let mut flight = FlightDetails::default();

        for line in rest.iter().take(self.config.lookahead_window) {
            if self.is_transaction_line(line) {
                break;
            }

            if probe_flight {
                if let Some(c) = re_airport_pair()
                    .captures(line)
                    .or_else(|| re_airport_run().captures(line))
                {
                    flight.departure_airport = Some(c[1].to_string());
                    flight.arrival_airport = Some(c[2].to_string());
                    continue;
                }
                if re_ticket_number().is_match(line) {
                    flight.ticket_number = Some(line.to_string());
                    continue;
                }
            }

            if charge.foreign_currency_type.is_none() {
                if self.config.currency_keyword_in(line) || re_all_caps_words().is_match(line) {
                    charge.foreign_currency_type = Some(line.to_string());
                }
            } else if charge.foreign_currency_amount.is_none() {
                if let Some(c) = re_conversion_rate().captures(line) {
                    charge.foreign_currency_amount = normalize::parse_amount_opt(&c[1]);
                    charge.is_foreign_currency = charge.foreign_currency_amount.is_some();
                }
            }
        }

        if !flight.is_empty() {
            flight.airline = Some(charge.merchant.clone());
            charge.flight_details = Some(flight);
        }
    }
}
