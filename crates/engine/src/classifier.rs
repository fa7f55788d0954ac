use std::future::Future;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier request timed out")]
    Timeout,
    #[error("classifier returned malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("classifier response is not a JSON array")]
    NotAnArray,
}

impl ClassifyError {
    /// Timeouts are surfaced as their own variant so the caller can tell
    /// them from plain transport failures.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> ClassifyError {
        if err.is_timeout() {
            ClassifyError::Timeout
        } else {
            ClassifyError::Http(err)
        }
    }
}

/// External text-classification collaborator behind the generic parser.
///
/// The response contract is a JSON array of
/// `{merchant, amount, date, allocated_to?}` objects; the generic parser
/// treats it as untrusted and coerces every field defensively. Anything
/// other than an array is a fatal error for that call.
pub trait ChargeClassifier: Send + Sync {
    fn classify(
        &self,
        statement_text: &str,
    ) -> impl Future<Output = Result<Value, ClassifyError>> + Send;
}

// ── Mock classifier (used for tests) ──────────────────────────────────────────

/// Returns a pre-set payload, ignoring the statement text.
pub struct MockClassifier {
    pub payload: Value,
}

impl MockClassifier {
    pub fn new(payload: Value) -> Self {
        MockClassifier { payload }
    }
}

impl ChargeClassifier for MockClassifier {
    fn classify(
        &self,
        _statement_text: &str,
    ) -> impl Future<Output = Result<Value, ClassifyError>> + Send {
        std::future::ready(Ok(self.payload.clone()))
    }
}
