//! HTTP client for the provider's queue, stream, and storage endpoints

use super::error::ProviderError;
use super::types::{QueueRun, QueueState, QueueStatus, QueueSubmitResponse, StreamAggregate, UploadGrant};
use crate::config::Config;
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const QUEUE_BASE: &str = "https://queue.fal.run";
const STREAM_BASE: &str = "https://fal.run";
const STORAGE_BASE: &str = "https://rest.alpha.fal.ai";

/// Delay between queue status polls.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Client for the upstream queue, stream, and storage APIs.
///
/// One instance is shared across all handlers. The credential is attached
/// per request, so callers bringing their own key reuse the same
/// connection pool. The key itself is never logged.
pub struct FalClient {
    http: reqwest::Client,
    queue_base: String,
    stream_base: String,
    storage_base: String,
    api_key: String,
    /// Wall clock budget for one complete upstream operation
    budget: Duration,
}

impl FalClient {
    /// Create a client from gateway configuration.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fal-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            queue_base: QUEUE_BASE.to_string(),
            stream_base: STREAM_BASE.to_string(),
            storage_base: STORAGE_BASE.to_string(),
            api_key: config.fal_api_key.clone(),
            budget: config.upstream_budget,
        })
    }

    /// Point the client at alternate endpoints. Tests use this to run
    /// against a local mock server.
    pub fn with_endpoints(mut self, queue: &str, stream: &str, storage: &str) -> Self {
        self.queue_base = queue.trim_end_matches('/').to_string();
        self.stream_base = stream.trim_end_matches('/').to_string();
        self.storage_base = storage.trim_end_matches('/').to_string();
        self
    }

    /// The credential for one request: the caller's key when supplied,
    /// otherwise the shared gateway key.
    fn credential<'a>(&'a self, custom: Option<&'a str>) -> &'a str {
        match custom {
            Some(key) if !key.is_empty() => key,
            _ => &self.api_key,
        }
    }

    /// Submit to the queue and wait for the result, under the configured
    /// wall clock budget.
    pub async fn run_queued(
        &self,
        model: &str,
        input: &Value,
        custom_key: Option<&str>,
    ) -> Result<QueueRun, ProviderError> {
        tokio::time::timeout(self.budget, self.run_queued_inner(model, input, custom_key))
            .await
            .map_err(|_| {
                ProviderError::timeout(format!("no result within {}s", self.budget.as_secs()))
            })?
    }

    async fn run_queued_inner(
        &self,
        model: &str,
        input: &Value,
        custom_key: Option<&str>,
    ) -> Result<QueueRun, ProviderError> {
        let key = self.credential(custom_key);
        let submit_url = format!("{}/{}", self.queue_base, model);

        debug!("Submitting queued request to {}", model);

        let response = self
            .http
            .post(&submit_url)
            .header("Authorization", format!("Key {}", key))
            .json(input)
            .send()
            .await?;
        let response = check_response(response).await?;

        let submit: QueueSubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parsing(e.to_string()))?;

        loop {
            let status_response = self
                .http
                .get(&submit.status_url)
                .header("Authorization", format!("Key {}", key))
                .send()
                .await?;
            let status_response = check_response(status_response).await?;
            let status: QueueStatus = status_response
                .json()
                .await
                .map_err(|e| ProviderError::parsing(e.to_string()))?;

            if status.status == QueueState::Completed {
                break;
            }
            debug!(
                "Request {} is {:?} (queue position {:?})",
                submit.request_id, status.status, status.queue_position
            );
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let result_response = self
            .http
            .get(&submit.response_url)
            .header("Authorization", format!("Key {}", key))
            .send()
            .await?;
        let result_response = check_response(result_response).await?;
        let payload: Value = result_response
            .json()
            .await
            .map_err(|e| ProviderError::parsing(e.to_string()))?;

        debug!("Request {} completed", submit.request_id);

        Ok(QueueRun {
            request_id: submit.request_id,
            payload,
        })
    }

    /// Invoke a model's streaming endpoint and collect every event.
    ///
    /// The endpoint speaks server-sent events: `data:` lines carrying
    /// JSON, terminated by a `[DONE]` marker.
    pub async fn run_stream(
        &self,
        model: &str,
        input: &Value,
        custom_key: Option<&str>,
    ) -> Result<StreamAggregate, ProviderError> {
        tokio::time::timeout(self.budget, self.run_stream_inner(model, input, custom_key))
            .await
            .map_err(|_| {
                ProviderError::timeout(format!("stream open after {}s", self.budget.as_secs()))
            })?
    }

    async fn run_stream_inner(
        &self,
        model: &str,
        input: &Value,
        custom_key: Option<&str>,
    ) -> Result<StreamAggregate, ProviderError> {
        let key = self.credential(custom_key);
        let stream_url = format!("{}/{}/stream", self.stream_base, model);

        debug!("Opening stream to {}", model);

        let response = self
            .http
            .post(&stream_url)
            .header("Authorization", format!("Key {}", key))
            .json(input)
            .send()
            .await?;
        let response = check_response(response).await?;

        let mut aggregate = StreamAggregate::default();
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    break 'outer;
                }
                match serde_json::from_str::<Value>(data) {
                    Ok(event) => {
                        aggregate.final_event = Some(event.clone());
                        aggregate.events.push(event);
                    }
                    Err(e) => debug!("Skipping unparseable stream event: {}", e),
                }
            }
        }

        debug!("Stream from {} closed after {} events", model, aggregate.events.len());

        Ok(aggregate)
    }

    /// Upload raw bytes to provider storage, returning the hosted URL.
    ///
    /// Two steps: an initiate call that returns a presigned upload URL
    /// plus the final file URL, then a PUT of the bytes. The PUT goes to
    /// presigned storage and carries no Authorization header.
    pub async fn upload(
        &self,
        bytes: Bytes,
        content_type: &str,
        file_name: &str,
        custom_key: Option<&str>,
    ) -> Result<String, ProviderError> {
        tokio::time::timeout(
            self.budget,
            self.upload_inner(bytes, content_type, file_name, custom_key),
        )
        .await
        .map_err(|_| ProviderError::timeout(format!("upload after {}s", self.budget.as_secs())))?
    }

    async fn upload_inner(
        &self,
        bytes: Bytes,
        content_type: &str,
        file_name: &str,
        custom_key: Option<&str>,
    ) -> Result<String, ProviderError> {
        let key = self.credential(custom_key);
        let initiate_url = format!("{}/storage/upload/initiate", self.storage_base);

        let response = self
            .http
            .post(&initiate_url)
            .header("Authorization", format!("Key {}", key))
            .json(&json!({
                "content_type": content_type,
                "file_name": file_name,
            }))
            .send()
            .await?;
        let response = check_response(response).await?;

        let grant: UploadGrant = response
            .json()
            .await
            .map_err(|e| ProviderError::parsing(e.to_string()))?;

        let put_response = self
            .http
            .put(&grant.upload_url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;
        check_response(put_response).await?;

        debug!("Uploaded {} to provider storage", file_name);
        Ok(grant.file_url)
    }
}

/// Convert an error status into a typed provider error, extracting the
/// `detail` field the provider uses for error bodies when present.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            value.get("detail").map(|detail| match detail {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
        })
        .unwrap_or(body);

    warn!("Provider returned {} for upstream call", status);
    Err(ProviderError::from_status(status.as_u16(), message))
}
