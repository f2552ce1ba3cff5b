/// HTTP client for the prefill API. Every call the agent makes to the
/// authorizing service goes through here.
use std::fmt;
use std::time::Duration;

use prefill_protocol::{IntentPayload, PrefillLog, ReportResultRequest, ReportResultResponse};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AgentError;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The plaintext intent token. Held only in memory for the length of one run.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn error_message(body: String) -> String {
    serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// When a failed call may be sent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    /// Reads: connection failures, 429 and 5xx.
    Idempotent,
    /// Writes: only when the service cannot have acted on the request, i.e.
    /// the connection was never made or it answered 429.
    Unprocessed,
}

impl Retry {
    fn status(self, status: StatusCode) -> bool {
        match self {
            Retry::Idempotent => {
                status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Retry::Unprocessed => status == StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn transport(self, error: &reqwest::Error) -> bool {
        match self {
            Retry::Idempotent => true,
            Retry::Unprocessed => error.is_connect(),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AgentError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/prefill/{}", self.base_url, path)
    }

    /// Sends a request, retrying what `retry` allows with exponential backoff.
    /// Any other status is returned as-is.
    async fn send(
        &self,
        retry: Retry,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, AgentError> {
        let mut last_error: Option<AgentError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Prefill API call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) if retry.transport(&e) => {
                    last_error = Some(AgentError::Transport(e));
                    continue;
                }
                Err(e) => return Err(AgentError::Transport(e)),
            };

            let status = response.status();
            if retry.status(status) {
                let body = response.text().await.unwrap_or_default();
                warn!("Prefill API returned {status}");
                last_error = Some(AgentError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }
            return Ok(response);
        }

        Err(last_error.unwrap_or(AgentError::Api {
            status: 0,
            message: format!("gave up after {MAX_RETRIES} attempts"),
        }))
    }

    async fn api_error(response: Response) -> AgentError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AgentError::Api {
            status,
            message: error_message(body),
        }
    }

    /// GET intent/{id}. Reading does not consume the intent.
    pub async fn fetch_intent(
        &self,
        intent_id: Uuid,
        token: &AuthToken,
    ) -> Result<IntentPayload, AgentError> {
        let url = self.url(&format!("intent/{intent_id}"));
        let response = self
            .send(Retry::Idempotent, || {
                self.client.get(&url).bearer_auth(token.expose())
            })
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(AgentError::Unauthorized),
            StatusCode::NOT_FOUND => Err(AgentError::NotFound),
            s if s.is_success() => {
                let intent: IntentPayload = response.json().await?;
                debug!(
                    "Fetched intent {intent_id}: {} fields, {} attachments",
                    intent.user_fields.len(),
                    intent.attachments.len()
                );
                Ok(intent)
            }
            _ => Err(Self::api_error(response).await),
        }
    }

    /// POST report-result. A 401 here means the log was discarded by the service.
    /// Never resent once the service may have seen it, so a 401 cannot come
    /// from this run's own earlier attempt.
    pub async fn report_result(
        &self,
        intent_id: Uuid,
        token: &AuthToken,
        log: &PrefillLog,
    ) -> Result<ReportResultResponse, AgentError> {
        let url = self.url("report-result");
        let body = ReportResultRequest {
            intent_id,
            token: token.expose().to_string(),
            log: log.clone(),
        };
        let response = self
            .send(Retry::Unprocessed, || self.client.post(&url).json(&body))
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(AgentError::ReportRejected),
            StatusCode::NOT_FOUND => Err(AgentError::NotFound),
            s if s.is_success() => Ok(response.json().await?),
            _ => Err(Self::api_error(response).await),
        }
    }
}
