use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ParseError;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_mdy4, r"^(\d{1,2})/(\d{1,2})/(\d{4})$");
re!(re_date_mdy2, r"^(\d{1,2})/(\d{1,2})/(\d{2})$");
re!(re_date_iso, r"^(\d{4})-(\d{2})-(\d{2})$");
re!(re_date_md, r"^(\d{1,2})/(\d{1,2})$");

// ── Dates ─────────────────────────────────────────────────────────────────────

/// The date shapes seen on statement lines and headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `MM/DD/YYYY`
    MonthDayYear4,
    /// `MM/DD/YY`, pivoted: YY < 50 → 20YY, else 19YY
    MonthDayYear2,
    /// `YYYY-MM-DD`
    Iso,
    /// Bare `MM/DD`; needs a year from the caller.
    MonthDay,
}

/// Parse a date token. With `format = None`, formats are tried in a fixed
/// order (MM/DD/YYYY, MM/DD/YY, ISO, MM/DD) and the first structural match
/// wins. Bare `MM/DD` requires `default_year`.
///
/// Month and day are range-checked (1–12, 1–31) and the final calendar
/// construction rejects impossible dates such as 02/31.
pub fn parse_date(s: &str, format: Option<DateFormat>, default_year: Option<i32>) -> Option<NaiveDate> {
    let s = s.trim();
    match format {
        Some(DateFormat::MonthDayYear4) => parse_mdy4(s),
        Some(DateFormat::MonthDayYear2) => parse_mdy2(s),
        Some(DateFormat::Iso) => parse_iso(s),
        Some(DateFormat::MonthDay) => parse_md(s, default_year?),
        None => parse_mdy4(s)
            .or_else(|| parse_mdy2(s))
            .or_else(|| parse_iso(s))
            .or_else(|| default_year.and_then(|y| parse_md(s, y))),
    }
}

/// Strict variant: invalid input raises instead of returning None.
pub fn parse_date_strict(
    s: &str,
    format: Option<DateFormat>,
    default_year: Option<i32>,
) -> Result<NaiveDate, ParseError> {
    parse_date(s, format, default_year).ok_or_else(|| ParseError::InvalidDate(s.to_string()))
}

/// Two-digit year pivot shared by every `YY` format.
pub fn expand_two_digit_year(yy: i32) -> i32 {
    if yy < 50 {
        2000 + yy
    } else {
        1900 + yy
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_mdy4(s: &str) -> Option<NaiveDate> {
    let c = re_date_mdy4().captures(s)?;
    ymd(c[3].parse().ok()?, c[1].parse().ok()?, c[2].parse().ok()?)
}

fn parse_mdy2(s: &str) -> Option<NaiveDate> {
    let c = re_date_mdy2().captures(s)?;
    let year = expand_two_digit_year(c[3].parse().ok()?);
    ymd(year, c[1].parse().ok()?, c[2].parse().ok()?)
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    let c = re_date_iso().captures(s)?;
    ymd(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
}

fn parse_md(s: &str, year: i32) -> Option<NaiveDate> {
    let c = re_date_md().captures(s)?;
    ymd(year, c[1].parse().ok()?, c[2].parse().ok()?)
}

// ── Amounts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AmountOptions {
    /// Substituted when the input is unparseable (or negative while
    /// `allow_negative` is off).
    pub default: Decimal,
    pub allow_negative: bool,
}

impl Default for AmountOptions {
    fn default() -> Self {
        AmountOptions {
            default: Decimal::ZERO,
            allow_negative: true,
        }
    }
}

/// Parse a printed amount: currency symbols, thousands separators and
/// whitespace are stripped; `(x)` and leading `-` negate.
pub fn parse_amount_opt(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let (parens, s) = match s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let clean = s.replace([',', '$', ' '], "");
    if clean.is_empty() {
        return None;
    }
    let mut dec = Decimal::from_str(&clean).ok()?;
    if parens {
        dec = -dec;
    }
    Some(dec)
}

pub fn parse_amount(s: &str, opts: &AmountOptions) -> Decimal {
    match parse_amount_opt(s) {
        Some(dec) if dec.is_sign_negative() && !opts.allow_negative => opts.default,
        Some(dec) => dec,
        None => opts.default,
    }
}

// ── Merchant cleanup ──────────────────────────────────────────────────────────

const LEGAL_SUFFIXES: &[&str] = &["LLC", "INC", "CORP", "CO", "LTD", "LP", "LLP"];

#[derive(Debug, Clone, Default)]
pub struct MerchantCleanup {
    pub strip_legal_suffix: bool,
    pub title_case: bool,
}

/// Trim and collapse whitespace, optionally dropping a trailing
/// legal-entity suffix and title-casing the result.
pub fn clean_merchant(raw: &str, opts: &MerchantCleanup) -> String {
    let mut words: Vec<&str> = raw.split_whitespace().collect();

    if opts.strip_legal_suffix {
        if let Some(last) = words.last() {
            let bare = last.trim_end_matches(['.', ',']).to_uppercase();
            if words.len() > 1 && LEGAL_SUFFIXES.contains(&bare.as_str()) {
                words.pop();
            }
        }
    }

    if opts.title_case {
        words
            .iter()
            .map(|w| title_case_word(w))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        words.join(" ")
    }
}

fn title_case_word(w: &str) -> String {
    let mut chars = w.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ── Required-field validation ─────────────────────────────────────────────────

/// Whether every key is present and truthy on a JSON object.
/// Falsy: missing, null, `""`, `0`, `false`.
pub fn required_fields_present(value: &serde_json::Value, keys: &[&str]) -> bool {
    keys.iter().all(|key| {
        match value.get(key) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
            Some(_) => true,
        }
    })
}

/// Strict variant: raises on the first missing key.
pub fn require_fields(value: &serde_json::Value, keys: &[&str]) -> Result<(), ParseError> {
    for key in keys {
        if !required_fields_present(value, &[key]) {
            return Err(ParseError::MissingField((*key).to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── dates ────────────────────────────────────────────────────────────────

    #[test]
    fn parse_date_four_digit_year() {
        assert_eq!(
            parse_date("01/15/2024", Some(DateFormat::MonthDayYear4), None),
            Some(date(2024, 1, 15))
        );
    }

    #[test]
    fn parse_date_two_digit_pivot_full_range() {
        for yy in 0..=99 {
            let s = format!("06/15/{yy:02}");
            let expected = if yy < 50 { 2000 + yy } else { 1900 + yy };
            let parsed = parse_date(&s, Some(DateFormat::MonthDayYear2), None);
            assert_eq!(parsed, Some(date(expected, 6, 15)), "input {s}");
        }
    }

    #[test]
    fn parse_date_iso() {
        assert_eq!(
            parse_date("2024-03-09", Some(DateFormat::Iso), None),
            Some(date(2024, 3, 9))
        );
    }

    #[test]
    fn parse_date_bare_month_day_needs_year() {
        assert_eq!(
            parse_date("01/15", Some(DateFormat::MonthDay), Some(2024)),
            Some(date(2024, 1, 15))
        );
        assert_eq!(parse_date("01/15", Some(DateFormat::MonthDay), None), None);
    }

    #[test]
    fn parse_date_auto_detect_order() {
        assert_eq!(parse_date("01/15/2024", None, None), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("01/15/24", None, None), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15", None, None), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("01/15", None, Some(2023)), Some(date(2023, 1, 15)));
    }

    #[test]
    fn parse_date_rejects_out_of_range() {
        // Never a best-effort guess.
        assert_eq!(parse_date("13/01/2024", None, None), None);
        assert_eq!(parse_date("12/32/2024", None, None), None);
        assert_eq!(parse_date("13/32/2024", None, None), None);
        assert_eq!(parse_date("00/10/2024", None, None), None);
        assert_eq!(parse_date("02/31/2024", None, None), None);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date("not a date", None, Some(2024)), None);
        assert_eq!(parse_date("", None, Some(2024)), None);
        assert_eq!(parse_date("1/2/3/4", None, Some(2024)), None);
    }

    #[test]
    fn parse_date_strict_raises() {
        assert!(matches!(
            parse_date_strict("13/32/2024", None, None),
            Err(ParseError::InvalidDate(_))
        ));
        assert_eq!(
            parse_date_strict("01/15/2024", None, None).unwrap(),
            date(2024, 1, 15)
        );
    }

    // ── amounts ──────────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_plain_and_symbols() {
        let opts = AmountOptions::default();
        assert_eq!(parse_amount("123.45", &opts), dec("123.45"));
        assert_eq!(parse_amount("$99.99", &opts), dec("99.99"));
        assert_eq!(parse_amount("1,234.56", &opts), dec("1234.56"));
        assert_eq!(parse_amount("$ 1,234.56", &opts), dec("1234.56"));
    }

    #[test]
    fn parse_amount_negative_forms() {
        let opts = AmountOptions::default();
        assert_eq!(parse_amount("-50.00", &opts), dec("-50.00"));
        assert_eq!(parse_amount("(75.25)", &opts), dec("-75.25"));
        assert_eq!(parse_amount("($75.25)", &opts), dec("-75.25"));
    }

    #[test]
    fn parse_amount_idempotent_over_rendering() {
        let opts = AmountOptions::default();
        for s in ["$1,234.56", "-1234.56", "(1,234.56)", "1234.56"] {
            let first = parse_amount(s, &opts);
            let again = parse_amount(&first.to_string(), &opts);
            assert_eq!(first.abs(), dec("1234.56"));
            assert_eq!(first, again, "re-parse of {s}");
        }
    }

    #[test]
    fn parse_amount_default_on_unparseable() {
        let opts = AmountOptions {
            default: dec("7"),
            allow_negative: true,
        };
        assert_eq!(parse_amount("garbage", &opts), dec("7"));
        assert_eq!(parse_amount("", &opts), dec("7"));
    }

    #[test]
    fn parse_amount_reject_negative_flag() {
        let opts = AmountOptions {
            default: Decimal::ZERO,
            allow_negative: false,
        };
        assert_eq!(parse_amount("-50.00", &opts), Decimal::ZERO);
        assert_eq!(parse_amount("50.00", &opts), dec("50.00"));
    }

    // ── merchant cleanup ─────────────────────────────────────────────────────

    #[test]
    fn clean_merchant_trims_and_collapses() {
        let out = clean_merchant("  AMAZON.COM   SEATTLE  ", &MerchantCleanup::default());
        assert_eq!(out, "AMAZON.COM SEATTLE");
    }

    #[test]
    fn clean_merchant_strips_legal_suffix() {
        let opts = MerchantCleanup {
            strip_legal_suffix: true,
            title_case: false,
        };
        assert_eq!(clean_merchant("ACME CORP", &opts), "ACME");
        assert_eq!(clean_merchant("ACME Corp.", &opts), "ACME");
        assert_eq!(clean_merchant("WIDGETS LLC", &opts), "WIDGETS");
        // A bare suffix is the whole name — keep it.
        assert_eq!(clean_merchant("LLC", &opts), "LLC");
    }

    #[test]
    fn clean_merchant_title_case() {
        let opts = MerchantCleanup {
            strip_legal_suffix: false,
            title_case: true,
        };
        assert_eq!(clean_merchant("WHOLE FOODS MARKET", &opts), "Whole Foods Market");
    }

    // ── required fields ──────────────────────────────────────────────────────

    #[test]
    fn required_fields_truthiness() {
        let value = json!({
            "merchant": "AMAZON",
            "amount": 12.5,
            "empty": "",
            "zero": 0,
            "flag": false,
            "null": null,
        });
        assert!(required_fields_present(&value, &["merchant", "amount"]));
        assert!(!required_fields_present(&value, &["empty"]));
        assert!(!required_fields_present(&value, &["zero"]));
        assert!(!required_fields_present(&value, &["flag"]));
        assert!(!required_fields_present(&value, &["null"]));
        assert!(!required_fields_present(&value, &["absent"]));
    }

    #[test]
    fn require_fields_strict_raises_first_missing() {
        let value = json!({"merchant": "AMAZON"});
        match require_fields(&value, &["merchant", "amount"]) {
            Err(ParseError::MissingField(key)) => assert_eq!(key, "amount"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
