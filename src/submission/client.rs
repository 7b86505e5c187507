//! HTTP client for the vectorization endpoint.

use crate::config::Config;
use crate::payload::SubmissionPayload;
use crate::submission::types::{SubmissionError, SubmissionOutcome, VectorizeResponse};
use async_trait::async_trait;
use reqwest::{Client, Url};

/// Destination for document submissions.
#[async_trait]
pub trait Vectorizer: Send + Sync {
    /// Submit one document; exactly one request per call.
    async fn submit(&self, payload: &SubmissionPayload)
    -> Result<SubmissionOutcome, SubmissionError>;
}

/// Lightweight HTTP client posting documents to the vectorization API.
pub struct VectorizeService {
    pub(crate) client: Client,
    pub(crate) endpoint: Url,
    pub(crate) api_key: Option<String>,
}

impl VectorizeService {
    /// Construct a new client from the run configuration.
    pub fn new(config: &Config) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .user_agent(concat!("iadb-vectorizer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let endpoint = Url::parse(&config.vectorize_api_url)
            .map_err(|err| SubmissionError::InvalidUrl(err.to_string()))?;
        tracing::debug!(
            url = %endpoint,
            has_api_key = config.vectorize_api_key.is_some(),
            "Initialized vectorization HTTP client"
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.vectorize_api_key.clone(),
        })
    }
}

#[async_trait]
impl Vectorizer for VectorizeService {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&payload.request_body());
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = SubmissionError::UnexpectedStatus { status, body };
            tracing::error!(file = %payload.name, error = %error, "Vectorization request failed");
            return Err(error);
        }

        let body = response.text().await?;
        let parsed: VectorizeResponse =
            serde_json::from_str(&body).map_err(SubmissionError::InvalidResponse)?;
        let outcome = parsed.classify()?;
        match outcome {
            SubmissionOutcome::Skipped { existing_chunks } => {
                tracing::info!(file = %payload.name, existing_chunks, "Document already indexed");
            }
            SubmissionOutcome::Indexed { chunks } => {
                tracing::debug!(file = %payload.name, chunks, "Document indexed");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn service(server: &MockServer, api_key: Option<&str>) -> VectorizeService {
        VectorizeService {
            client: Client::builder()
                .user_agent("iadb-vectorizer-test")
                .build()
                .expect("client"),
            endpoint: Url::parse(&server.url("/api/vectorize")).expect("url"),
            api_key: api_key.map(str::to_string),
        }
    }

    fn payload() -> SubmissionPayload {
        SubmissionPayload {
            name: "IDB-1.pdf".into(),
            id: "obj-1".into(),
            title: "Title".into(),
            content: "Título: Title".into(),
            size_bytes: 10,
            created_at: "2024-01-01T00:00:00Z".into(),
            namespace: "*",
            flow: "@",
        }
    }

    #[tokio::test]
    async fn fresh_document_reports_created_chunks() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/vectorize")
                    .header("authorization", "Bearer secret")
                    .json_body_partial(r#"{"namespace": "*", "flow": "@", "text": {"id": "obj-1"}}"#);
                then.status(200)
                    .json_body(json!({ "success": true, "results": [{}, {}, {}] }));
            })
            .await;

        let outcome = service(&server, Some("secret"))
            .submit(&payload())
            .await
            .expect("submission");

        mock.assert();
        assert_eq!(outcome, SubmissionOutcome::Indexed { chunks: 3 });
    }

    #[tokio::test]
    async fn existing_document_is_a_skip() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/vectorize");
                then.status(200).json_body(
                    json!({ "success": true, "skipped": true, "existingChunks": 12 }),
                );
            })
            .await;

        let outcome = service(&server, None)
            .submit(&payload())
            .await
            .expect("submission");

        assert_eq!(outcome, SubmissionOutcome::Skipped { existing_chunks: 12 });
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/vectorize");
                then.status(429).body("rate limited");
            })
            .await;

        let error = service(&server, None)
            .submit(&payload())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "API Error: 429 - rate limited");
    }

    #[tokio::test]
    async fn failed_status_without_body_keeps_the_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/vectorize");
                then.status(503);
            })
            .await;

        let error = service(&server, None)
            .submit(&payload())
            .await
            .unwrap_err();

        match error {
            SubmissionError::UnexpectedStatus { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert!(body.is_empty());
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn application_failure_is_rejected_with_service_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/vectorize");
                then.status(200)
                    .json_body(json!({ "success": false, "error": "embedding quota exceeded" }));
            })
            .await;

        let error = service(&server, None)
            .submit(&payload())
            .await
            .unwrap_err();

        assert!(matches!(error, SubmissionError::Rejected(_)));
        assert_eq!(error.to_string(), "embedding quota exceeded");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/vectorize");
                then.status(200).body("<html>ok</html>");
            })
            .await;

        let error = service(&server, None)
            .submit(&payload())
            .await
            .unwrap_err();

        assert!(matches!(error, SubmissionError::InvalidResponse(_)));
    }
}
