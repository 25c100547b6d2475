//! External ML service client
//!
//! Sentiment classification and summarization live in a separate HTTP
//! service. Three endpoints are used:
//! - `POST /predict_sentiment {comment}` -> `{predicted_sentiment}`
//! - `POST /api/summarize {comments}` -> `{summaries}`
//! - `POST /api/summarize_group {comments}` -> `{final_summary | summary | summaries}`
//!
//! Callers treat every error from this module as recoverable and fall back
//! to defaults.

use crate::config::MlConfig;
use crate::errors::{AppError, Result};
use crate::metrics::record_ml_call;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for the sentiment/summarization backend
#[async_trait]
pub trait MlClient: Send + Sync {
    /// Raw sentiment label predicted for one comment, if the service gave one
    async fn predict_sentiment(&self, comment: &str) -> Result<Option<String>>;

    /// One summary per input comment
    async fn summarize(&self, comments: &[String]) -> Result<Vec<String>>;

    /// A single summary covering a group of comments
    async fn summarize_group(&self, comments: &[String]) -> Result<Option<String>>;

    /// Whether calls can succeed at all
    fn is_enabled(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
struct SentimentRequest<'a> {
    comment: &'a str,
}

#[derive(Serialize)]
struct CommentsRequest<'a> {
    comments: &'a [String],
}

#[derive(Deserialize)]
struct SentimentResponse {
    predicted_sentiment: Option<String>,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summaries: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct GroupSummaryResponse {
    final_summary: Option<String>,
    summary: Option<String>,
    summaries: Option<Vec<String>>,
}

impl GroupSummaryResponse {
    /// First non-empty of `final_summary`, `summary`, `summaries[0]`
    fn into_text(self) -> Option<String> {
        let first = self.summaries.and_then(|s| s.into_iter().next());
        [self.final_summary, self.summary, first]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
    }
}

/// HTTP client for the ML service
pub struct HttpMlClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpMlClient {
    /// Create a client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    /// Make request with retry
    async fn request_with_retry<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self.make_request(path, body).await;
            record_ml_call(path, start.elapsed().as_secs_f64(), result.is_ok());

            match result {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        endpoint = path,
                        attempt = attempt + 1,
                        attempts = attempts,
                        error = %e,
                        "ML request failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::MlService {
            message: "Unknown error after retries".to_string(),
        }))
    }

    async fn make_request<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::MlService {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MlService {
                message: format!("API error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::MlService {
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl MlClient for HttpMlClient {
    async fn predict_sentiment(&self, comment: &str) -> Result<Option<String>> {
        let response: SentimentResponse = self
            .request_with_retry("/predict_sentiment", &SentimentRequest { comment })
            .await?;
        Ok(response.predicted_sentiment)
    }

    async fn summarize(&self, comments: &[String]) -> Result<Vec<String>> {
        let response: SummarizeResponse = self
            .request_with_retry("/api/summarize", &CommentsRequest { comments })
            .await?;
        Ok(response.summaries.unwrap_or_default())
    }

    async fn summarize_group(&self, comments: &[String]) -> Result<Option<String>> {
        let response: GroupSummaryResponse = self
            .request_with_retry("/api/summarize_group", &CommentsRequest { comments })
            .await?;
        Ok(response.into_text())
    }
}

/// Client used when no ML service is configured; every call fails so
/// callers fall back to their defaults.
pub struct NoopMlClient;

impl NoopMlClient {
    fn disabled() -> AppError {
        AppError::MlService {
            message: "ML service is not configured".to_string(),
        }
    }
}

#[async_trait]
impl MlClient for NoopMlClient {
    async fn predict_sentiment(&self, _comment: &str) -> Result<Option<String>> {
        Err(Self::disabled())
    }

    async fn summarize(&self, _comments: &[String]) -> Result<Vec<String>> {
        Err(Self::disabled())
    }

    async fn summarize_group(&self, _comments: &[String]) -> Result<Option<String>> {
        Err(Self::disabled())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Create an ML client based on configuration
pub fn create_ml_client(config: &MlConfig) -> Result<Arc<dyn MlClient>> {
    match config.base_url.as_deref().filter(|url| !url.is_empty()) {
        Some(base_url) => {
            tracing::info!(base_url = base_url, timeout_secs = config.timeout_secs, "Using ML service");
            let client = HttpMlClient::new(
                base_url,
                Duration::from_secs(config.timeout_secs),
                config.max_retries,
            )?;
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!("ML service URL not configured, comments will be stored without enrichment");
            Ok(Arc::new(NoopMlClient))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::StatusCode,
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str, max_retries: u32) -> HttpMlClient {
        HttpMlClient::new(base_url, Duration::from_secs(5), max_retries).unwrap()
    }

    fn healthy_service() -> Router {
        Router::new()
            .route(
                "/predict_sentiment",
                post(|Json(body): Json<Value>| async move {
                    let label = if body["comment"].as_str().unwrap_or("").contains("support") {
                        "POSITIVE"
                    } else {
                        "NEGATIVE"
                    };
                    Json(json!({ "predicted_sentiment": label, "score": 0.91 }))
                }),
            )
            .route(
                "/api/summarize",
                post(|Json(body): Json<Value>| async move {
                    let count = body["comments"].as_array().map(Vec::len).unwrap_or(0);
                    let summaries: Vec<String> = (0..count).map(|i| format!("summary {}", i)).collect();
                    Json(json!({ "summaries": summaries }))
                }),
            )
            .route(
                "/api/summarize_group",
                post(|| async { Json(json!({ "summary": "", "summaries": ["grouped"] })) }),
            )
    }

    #[tokio::test]
    async fn test_http_client_parses_responses() {
        let base_url = spawn_server(healthy_service()).await;
        let ml = client(&base_url, 0);

        let label = ml.predict_sentiment("I support this bill").await.unwrap();
        assert_eq!(label.as_deref(), Some("POSITIVE"));

        let summaries = ml.summarize(&["one".to_string(), "two".to_string()]).await.unwrap();
        assert_eq!(summaries, vec!["summary 0", "summary 1"]);

        // Empty `summary` falls through to `summaries[0]`
        let grouped = ml.summarize_group(&["a".to_string()]).await.unwrap();
        assert_eq!(grouped.as_deref(), Some("grouped"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let router = Router::new().route(
            "/predict_sentiment",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model loading").into_response() }),
        );
        let base_url = spawn_server(router).await;

        let err = client(&base_url, 0).predict_sentiment("text").await.unwrap_err();
        assert!(matches!(err, AppError::MlService { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let router = Router::new().route("/api/summarize", post(|| async { "not json" }));
        let base_url = spawn_server(router).await;

        let err = client(&base_url, 0).summarize(&["x".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr), 0)
            .predict_sentiment("text")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Request failed"));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/predict_sentiment",
                post(|State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        StatusCode::BAD_GATEWAY.into_response()
                    } else {
                        Json(json!({ "predicted_sentiment": "neutral" })).into_response()
                    }
                }),
            )
            .with_state(hits.clone());
        let base_url = spawn_server(router).await;

        let label = client(&base_url, 1).predict_sentiment("text").await.unwrap();
        assert_eq!(label.as_deref(), Some("neutral"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_fields_are_not_errors() {
        let router = Router::new()
            .route("/predict_sentiment", post(|| async { Json(json!({})) }))
            .route("/api/summarize_group", post(|| async { Json(json!({ "summaries": [] })) }));
        let base_url = spawn_server(router).await;
        let ml = client(&base_url, 0);

        assert_eq!(ml.predict_sentiment("text").await.unwrap(), None);
        assert_eq!(ml.summarize_group(&["a".to_string()]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disabled_client_always_fails() {
        let ml = create_ml_client(&MlConfig::default()).unwrap();
        assert!(!ml.is_enabled());
        assert!(ml.predict_sentiment("text").await.is_err());
        assert!(ml.summarize_group(&[]).await.is_err());
    }

    #[test]
    fn test_group_summary_precedence() {
        let response = GroupSummaryResponse {
            final_summary: Some("final".into()),
            summary: Some("plain".into()),
            summaries: Some(vec!["first".into()]),
        };
        assert_eq!(response.into_text().as_deref(), Some("final"));

        let response = GroupSummaryResponse {
            final_summary: None,
            summary: Some("plain".into()),
            summaries: None,
        };
        assert_eq!(response.into_text().as_deref(), Some("plain"));
    }
}
