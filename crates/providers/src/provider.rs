use chrono::NaiveDate;

use cardparse_core::{Charge, ParseError, StatementParseResult};

/// Billing-cycle boundaries printed on the statement header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillingCycle {
    pub opened_on: Option<NaiveDate>,
    pub closed_on: Option<NaiveDate>,
}

/// Card identity recovered from the statement header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardInfo {
    pub last4: Option<String>,
}

/// The capability contract every issuing-bank parser implements.
///
/// Implementations are immutable after construction and hold no state
/// across calls, so a single instance can serve concurrent parses.
pub trait ProviderParser: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Cheap detection over the raw text. Keyword checks are
    /// case-insensitive and deliberately use long phrases so that
    /// unrelated substrings ("purchase", "Cash Advance") never match.
    fn can_parse(&self, text: &str) -> bool;

    fn extract_charges(&self, text: &str) -> Result<Vec<Charge>, ParseError>;

    fn extract_billing_cycle(&self, text: &str) -> BillingCycle;

    fn extract_card_info(&self, text: &str) -> CardInfo;

    /// Compose the extractors into a validated result.
    fn parse(&self, text: &str) -> Result<StatementParseResult, ParseError> {
        let cycle = self.extract_billing_cycle(text);
        let card = self.extract_card_info(text);
        let charges = self.extract_charges(text)?;
        StatementParseResult {
            last4: card.last4,
            statement_date: cycle.closed_on,
            charges,
        }
        .into_validated()
    }
}
