use std::future::Future;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use crate::classifier::{ChargeClassifier, ClassifyError};

/// Reqwest-backed classifier client.
///
/// Posts `{"text": <statement>}` to the configured endpoint and expects
/// the JSON-array charge payload back. The timeout is fixed at
/// construction; when it fires the error surfaces as
/// `ClassifyError::Timeout`, never a silent retry.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClassifyError::from_reqwest)?;
        Ok(HttpClassifier {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl ChargeClassifier for HttpClassifier {
    fn classify(
        &self,
        statement_text: &str,
    ) -> impl Future<Output = Result<Value, ClassifyError>> + Send {
        async move {
            debug!(endpoint = %self.endpoint, bytes = statement_text.len(), "classifying statement");
            let response = self
                .client
                .post(&self.endpoint)
                .json(&json!({ "text": statement_text }))
                .send()
                .await
                .map_err(ClassifyError::from_reqwest)?
                .error_for_status()
                .map_err(ClassifyError::from_reqwest)?;

            let body = response
                .text()
                .await
                .map_err(ClassifyError::from_reqwest)?;
            let value: Value = serde_json::from_str(&body)?;
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_accepts_timeout() {
        let classifier = HttpClassifier::new("http://localhost:9/classify", Duration::from_secs(5));
        assert!(classifier.is_ok());
    }
}
