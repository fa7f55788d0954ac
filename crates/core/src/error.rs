use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no parser matched the statement text")]
    NoParserFound,
    #[error("incomplete parse result, missing: {}", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
    #[error("{provider} parser failed: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: Box<ParseError>,
    },
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("invalid config: {0}")]
    Config(String),
}

impl ParseError {
    /// Wrap a failure with the provider name that produced it.
    pub fn in_provider(self, provider: &'static str) -> ParseError {
        ParseError::Provider {
            provider,
            source: Box::new(self),
        }
    }
}
