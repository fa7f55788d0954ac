use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Itinerary fields recovered from a flight continuation block.
/// All fields are optional; a value is only attached to a charge when at
/// least one of them was recognized.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FlightDetails {
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub airline: Option<String>,
    pub ticket_number: Option<String>,
}

impl FlightDetails {
    pub fn is_empty(&self) -> bool {
        self.departure_airport.is_none()
            && self.arrival_airport.is_none()
            && self.airline.is_none()
            && self.ticket_number.is_none()
    }
}

/// One extracted transaction line.
///
/// The sign convention of `amount` is provider-defined: Chase keeps the
/// amount as printed, Wells Fargo stores the absolute value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Charge {
    pub merchant: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Downstream budget assignment; the deterministic parsers never set
    /// this, the fallback collaborator may.
    pub allocated_to: Option<String>,
    pub is_foreign_currency: bool,
    pub foreign_currency_amount: Option<Decimal>,
    pub foreign_currency_type: Option<String>,
    pub flight_details: Option<FlightDetails>,
    /// Raw source line, kept only for configured merchant keywords
    /// (marketplace orders) so later enrichment can re-read it.
    pub full_statement_text: Option<String>,
}

impl Charge {
    pub fn new(merchant: impl Into<String>, amount: Decimal, date: NaiveDate) -> Self {
        Charge {
            merchant: merchant.into(),
            amount,
            date,
            allocated_to: None,
            is_foreign_currency: false,
            foreign_currency_amount: None,
            foreign_currency_type: None,
            flight_details: None,
            full_statement_text: None,
        }
    }
}

/// The aggregate output of one statement parse.
///
/// Charges preserve source line order; the parser never merges or
/// reorders them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatementParseResult {
    pub last4: Option<String>,
    pub statement_date: Option<NaiveDate>,
    pub charges: Vec<Charge>,
}

impl StatementParseResult {
    /// Required-field check run before a result is handed to the caller.
    /// Lists every missing field rather than failing on the first.
    pub fn validate(&self) -> Result<(), ParseError> {
        let mut missing = Vec::new();
        if self.last4.as_deref().map_or(true, str::is_empty) {
            missing.push("last4");
        }
        if self.statement_date.is_none() {
            missing.push("statement_date");
        }
        if self.charges.is_empty() {
            missing.push("charges");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ParseError::Incomplete { missing })
        }
    }

    pub fn into_validated(self) -> Result<Self, ParseError> {
        self.validate()?;
        Ok(self)
    }
}
