use thiserror::Error;
use tracing::{debug, info, warn};

use cardparse_core::{ParseError, StatementParseResult};
use cardparse_providers::ParserRegistry;

use crate::classifier::{ChargeClassifier, ClassifyError};
use crate::generic::GenericParser;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("fallback classifier failed: {0}")]
    Classify(#[from] ClassifyError),
}

/// Top-level dispatch: deterministic providers first, classifier-backed
/// generic parser as the configured fallback.
///
/// The deterministic path is synchronous and completes in time bounded
/// by line count times the lookahead window; only the fallback awaits
/// the network. Nothing here retries.
pub struct StatementEngine<C: ChargeClassifier> {
    registry: ParserRegistry,
    fallback: Option<GenericParser<C>>,
}

impl<C: ChargeClassifier> StatementEngine<C> {
    pub fn new(registry: ParserRegistry, fallback: Option<GenericParser<C>>) -> Self {
        StatementEngine { registry, fallback }
    }

    pub async fn parse(&self, text: &str) -> Result<StatementParseResult, EngineError> {
        if let Some(parser) = self.registry.detect(text) {
            debug!(provider = parser.provider(), "deterministic parser matched");
            return Ok(self.registry.parse(text)?);
        }

        match &self.fallback {
            Some(generic) if generic.looks_like_statement(text) => {
                info!("no deterministic parser matched, delegating to classifier");
                generic.parse(text).await
            }
            Some(_) => {
                warn!("text does not look like a statement");
                Err(ParseError::NoParserFound.into())
            }
            None => {
                warn!("no deterministic parser matched and no fallback configured");
                Err(ParseError::NoParserFound.into())
            }
        }
    }
}
