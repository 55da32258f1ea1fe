//! OpenRouter API client.
//!
//! One configured model, one request in flight at a time. Transient
//! failures (network, timeout, 429, 5xx) are retried with exponential
//! backoff up to `max_retries`; 401 and 404 are not retried — waiting
//! will not fix a bad key or a wrong model ID.

use crate::models::{CredforgeError, OpenRouterError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request payload.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// OpenRouter API error response.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenRouter API client.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    total_requests: AtomicU64,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client.
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
        max_retries: Option<u32>,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(180));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CredforgeError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
            timeout,
            max_retries: max_retries.unwrap_or(3),
            total_requests: AtomicU64::new(0),
        })
    }

    /// Build headers for a request.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(auth) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, auth);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "HTTP-Referer",
            HeaderValue::from_static("https://github.com/infernet-org/credforge"),
        );
        headers.insert("X-Title", HeaderValue::from_static("credforge"));
        headers
    }

    /// Complete a chat request, returning the generated content.
    pub async fn complete(
        &self,
        model: &str,
        messages: Vec<Message>,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            max_tokens,
            temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error: Option<CredforgeError> = None;

        for attempt in 0..self.max_retries {
            self.total_requests.fetch_add(1, Ordering::Relaxed);

            let response = self
                .client
                .post(&url)
                .headers(self.headers())
                .json(&request)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        CredforgeError::Timeout(self.timeout)
                    } else {
                        CredforgeError::Network(e)
                    });
                    if attempt < self.max_retries - 1 {
                        let backoff = Duration::from_secs(2u64.pow(attempt));
                        debug!(
                            attempt = attempt,
                            backoff_secs = backoff.as_secs(),
                            "Retrying after network error"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(1.0);

                last_error = Some(CredforgeError::RateLimited {
                    retry_after_secs: retry_after,
                });

                if attempt < self.max_retries - 1 {
                    debug!(
                        attempt = attempt,
                        retry_after_secs = retry_after,
                        "Rate limited, waiting"
                    );
                    tokio::time::sleep(Duration::from_secs_f64(retry_after)).await;
                }
                continue;
            }

            if !response.status().is_success() {
                let error_body = response.text().await.unwrap_or_default();
                let error = if status == 401 {
                    OpenRouterError::AuthenticationFailed
                } else if status == 404 {
                    OpenRouterError::ModelNotFound(model.to_string())
                } else if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body)
                {
                    OpenRouterError::ApiError {
                        status,
                        message: api_error.error.message,
                    }
                } else {
                    OpenRouterError::ApiError {
                        status,
                        message: error_body,
                    }
                };

                last_error = Some(CredforgeError::OpenRouterApi(error));

                if status == 401 || status == 404 {
                    break;
                }

                if attempt < self.max_retries - 1 {
                    let backoff = Duration::from_secs(2u64.pow(attempt));
                    tokio::time::sleep(backoff).await;
                }
                continue;
            }

            let body: ChatCompletionResponse = response.json().await.map_err(|e| {
                CredforgeError::OpenRouterApi(OpenRouterError::InvalidResponse(format!(
                    "Failed to parse response: {e}"
                )))
            })?;

            return body
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| {
                    CredforgeError::OpenRouterApi(OpenRouterError::InvalidResponse(
                        "No choices in response".to_string(),
                    ))
                });
        }

        Err(last_error.unwrap_or_else(|| {
            CredforgeError::OpenRouterApi(OpenRouterError::MaxRetriesExceeded {
                attempts: self.max_retries,
                last_error: "Unknown error".to_string(),
            })
        }))
    }

    /// Total HTTP requests issued, including retries.
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }
}
