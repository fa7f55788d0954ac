use cardparse_core::config::ParseConfig;
use cardparse_core::{ParseError, StatementParseResult};

use crate::chase::ChaseParser;
use crate::provider::ProviderParser;
use crate::wells_fargo::WellsFargoParser;

/// Ordered list of deterministic provider parsers.
///
/// Detection is first-match-wins, so registration order is significant:
/// a loose parser registered ahead of a specific one would shadow it.
/// The list is built once at startup and injected; the registry itself
/// holds no mutable state.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ProviderParser>>,
}

impl ParserRegistry {
    pub fn new(parsers: Vec<Box<dyn ProviderParser>>) -> Self {
        ParserRegistry { parsers }
    }

    /// The built-in deterministic providers in their canonical order.
    pub fn with_default_providers(config: &ParseConfig) -> Self {
        ParserRegistry::new(vec![
            Box::new(ChaseParser::new(config.clone())),
            Box::new(WellsFargoParser::new(config.clone())),
        ])
    }

    /// First parser whose detection accepts the text, if any.
    pub fn detect(&self, text: &str) -> Option<&dyn ProviderParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(text))
            .map(|p| p.as_ref())
    }

    /// Detect and parse. Provider failures are wrapped with the provider
    /// name and re-raised; nothing is retried here.
    pub fn parse(&self, text: &str) -> Result<StatementParseResult, ParseError> {
        let parser = self.detect(text).ok_or(ParseError::NoParserFound)?;
        parser
            .parse(text)
            .map_err(|e| e.in_provider(parser.provider()))
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
