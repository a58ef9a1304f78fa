//! Slack Web API client for message posting and external file uploads.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::delivery::Artifact;
use crate::error::SlackError;

#[derive(Debug, Clone, Deserialize)]
struct ChatPostMessageResponse {
    ok: bool,
    ts: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GetUploadUrlExternalResponse {
    ok: bool,
    upload_url: Option<String>,
    file_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompleteUploadExternalResponse {
    ok: bool,
    error: Option<String>,
}

/// A message accepted by `chat.postMessage`, identified by its timestamp.
/// The timestamp doubles as the thread handle for later uploads.
#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub ts: String,
}

/// One reserved upload slot: consumed by the push and finalize phases of the
/// same upload call, never reused across artifacts.
#[derive(Debug, Clone)]
struct UploadSession {
    upload_url: String,
    file_id: String,
}

/// Bounded retry for Slack Web API calls: rate limits and server errors get
/// another attempt after a doubling delay, everything else fails immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Single-attempt policy: every call fails on its first bad response.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn retries_status(&self, attempt: usize, status: reqwest::StatusCode) -> bool {
        self.has_attempts_left(attempt)
            && (status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
    }

    fn retries_send_error(&self, attempt: usize, error: &reqwest::Error) -> bool {
        self.has_attempts_left(attempt) && (error.is_timeout() || error.is_connect())
    }

    fn has_attempts_left(&self, attempt: usize) -> bool {
        attempt < self.max_attempts.max(1)
    }

    /// Delay before the attempt that follows `attempt`. A server-supplied
    /// Retry-After hint wins over the doubling backoff, which caps at 64x.
    fn delay_for(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint;
        }
        let doublings = attempt.saturating_sub(1).min(6) as u32;
        self.base_delay.saturating_mul(2_u32.pow(doublings))
    }
}

fn retry_after_hint(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?;
    let seconds: u64 = value.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(seconds))
}

fn clip_body(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((index, _)) => format!("{}...", &body[..index]),
        None => body.to_string(),
    }
}

fn generate_upload_file_name() -> String {
    format!("{}.txt", Uuid::new_v4())
}

#[derive(Debug, Clone)]
/// Construction parameters for [`SlackApiClient`]. Supplied once at startup;
/// the token and channel never change for the process lifetime.
pub struct SlackApiClientConfig {
    pub api_base: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    retry: RetryPolicy,
}

impl SlackApiClient {
    pub fn new(config: SlackApiClientConfig) -> Result<Self, SlackError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("pingpost"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|source| SlackError::Http {
                operation: "client construction",
                source,
            })?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
            retry: config.retry,
        })
    }

    /// Posts a plain text message and returns its timestamp.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
    ) -> Result<PostedMessage, SlackError> {
        tracing::info!(channel, "posting message to slack");
        let payload = json!({
            "channel": channel,
            "text": text,
        });

        let response: ChatPostMessageResponse = self
            .request_json("chat.postMessage", || {
                self.http
                    .post(format!("{}/chat.postMessage", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&payload)
            })
            .await?;

        if !response.ok {
            return Err(SlackError::api("chat.postMessage", response.error));
        }
        let ts = response
            .ts
            .filter(|value| !value.trim().is_empty())
            .ok_or(SlackError::Protocol {
                operation: "chat.postMessage",
                field: "ts",
            })?;
        Ok(PostedMessage { ts })
    }

    /// Uploads one artifact under `thread_ts`: reserve a slot, push the raw
    /// bytes, finalize against the channel and thread. The phases run strictly
    /// in order and the first failure aborts the rest; a reserved slot left
    /// behind on the remote side is not cleaned up.
    pub async fn upload_to_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        artifact: &Artifact,
    ) -> Result<(), SlackError> {
        let file_name = generate_upload_file_name();
        let session = self.reserve_upload(&file_name, artifact.content.len()).await?;
        self.push_content(&session.upload_url, artifact.content.clone())
            .await?;
        self.complete_upload(&session.file_id, &artifact.title, channel, thread_ts)
            .await
    }

    async fn reserve_upload(
        &self,
        file_name: &str,
        length: usize,
    ) -> Result<UploadSession, SlackError> {
        tracing::info!(file_name, length, "requesting upload slot from slack");
        let length_value = length.to_string();
        let response: GetUploadUrlExternalResponse = self
            .request_json("files.getUploadURLExternal", || {
                self.http
                    .get(format!("{}/files.getUploadURLExternal", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .query(&[("filename", file_name), ("length", length_value.as_str())])
            })
            .await?;

        if !response.ok {
            return Err(SlackError::api("files.getUploadURLExternal", response.error));
        }
        let upload_url = response
            .upload_url
            .filter(|value| !value.trim().is_empty())
            .ok_or(SlackError::Protocol {
                operation: "files.getUploadURLExternal",
                field: "upload_url",
            })?;
        let file_id = response
            .file_id
            .filter(|value| !value.trim().is_empty())
            .ok_or(SlackError::Protocol {
                operation: "files.getUploadURLExternal",
                field: "file_id",
            })?;
        Ok(UploadSession {
            upload_url,
            file_id,
        })
    }

    async fn push_content(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), SlackError> {
        tracing::info!("pushing file content to slack upload url");
        let response = self
            .http
            .post(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|source| SlackError::Http {
                operation: "external upload",
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Transport {
                operation: "external upload",
                status: status.as_u16(),
                body: clip_body(&body, 320),
            });
        }
        Ok(())
    }

    async fn complete_upload(
        &self,
        file_id: &str,
        title: &str,
        channel: &str,
        thread_ts: &str,
    ) -> Result<(), SlackError> {
        tracing::info!(channel, thread_ts, "completing slack upload");
        let payload = json!({
            "files": [{ "id": file_id, "title": title }],
            "channel_id": channel,
            "thread_ts": thread_ts,
        });

        let response: CompleteUploadExternalResponse = self
            .request_json("files.completeUploadExternal", || {
                self.http
                    .post(format!("{}/files.completeUploadExternal", self.api_base))
                    .bearer_auth(&self.bot_token)
                    .json(&payload)
            })
            .await?;

        if !response.ok {
            return Err(SlackError::api(
                "files.completeUploadExternal",
                response.error,
            ));
        }
        Ok(())
    }

    async fn request_json<T, F>(&self, operation: &'static str, mut builder: F) -> Result<T, SlackError>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = builder()
                .header(
                    "x-pingpost-retry-attempt",
                    attempt.saturating_sub(1).to_string(),
                )
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<T>().await.map_err(|source| {
                            SlackError::Http { operation, source }
                        });
                    }

                    let hint = retry_after_hint(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if self.retry.retries_status(attempt, status) {
                        tokio::time::sleep(self.retry.delay_for(attempt, hint)).await;
                        continue;
                    }

                    return Err(SlackError::Transport {
                        operation,
                        status: status.as_u16(),
                        body: clip_body(&body, 800),
                    });
                }
                Err(error) => {
                    if self.retry.retries_send_error(attempt, &error) {
                        tokio::time::sleep(self.retry.delay_for(attempt, None)).await;
                        continue;
                    }
                    return Err(SlackError::Http {
                        operation,
                        source: error,
                    });
                }
            }
        }
    }
}
