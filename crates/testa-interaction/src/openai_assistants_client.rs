//! OpenAIAssistantsClient - REST implementation of the assistant service.
//!
//! Talks to the OpenAI Assistants API (v2) directly over HTTP. The base URL
//! is configurable so the same client can target a proxy or a test server.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use testa_core::assistant::{
    Assistant, AssistantService, FileObject, MessageRole, Run, Thread, ThreadMessage,
};
use testa_core::config::DEFAULT_API_BASE_URL;
use testa_core::{Result, TestaError};

const ASSISTANTS_BETA_HEADER: &str = "assistants=v2";
const PAGE_LIMIT: &str = "100";

/// Assistant service client backed by the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIAssistantsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAIAssistantsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIAssistantsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAIAssistantsClient {
    /// Creates a client for the public API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Overrides the API base URL (e.g. `http://localhost:8080/v1`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", ASSISTANTS_BETA_HEADER)
            .send()
            .await
            .map_err(|err| {
                TestaError::remote(
                    format!("OpenAI API request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(self.client.get(self.url(path)).query(query)).await?;
        parse_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        let response = self.send(self.client.post(self.url(path)).json(&body)).await?;
        parse_json(response).await
    }

    /// Follows `has_more`/`last_id` cursors until the listing is exhausted.
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut params: Vec<(&str, &str)> = query.to_vec();
            params.push(("limit", PAGE_LIMIT));
            if let Some(cursor) = after.as_deref() {
                params.push(("after", cursor));
            }

            let page: ListPage<T> = self.get_json(path, &params).await?;
            items.extend(page.data);

            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                (true, None) => {
                    tracing::warn!(
                        "[OpenAIAssistantsClient] {} reported more pages without a cursor",
                        path
                    );
                    break;
                }
                (false, _) => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl AssistantService for OpenAIAssistantsClient {
    async fn create_thread(&self) -> Result<Thread> {
        self.post_json("threads", json!({})).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        self.post_json(
            &format!("threads/{thread_id}/messages"),
            json!({ "role": role.as_str(), "content": content }),
        )
        .await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        self.post_json(
            &format!("threads/{thread_id}/runs"),
            json!({ "assistant_id": assistant_id }),
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.post_json(&format!("threads/{thread_id}/runs/{run_id}/cancel"), json!({}))
            .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get_json(&format!("threads/{thread_id}/runs/{run_id}"), &[])
            .await
    }

    async fn list_runs(&self, thread_id: &str) -> Result<Vec<Run>> {
        self.list_all(&format!("threads/{thread_id}/runs"), &[])
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        self.list_all(&format!("threads/{thread_id}/messages"), &[("order", "asc")])
            .await
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .send(self.client.get(self.url(&format!("files/{file_id}/content"))))
            .await?;
        let bytes = response.bytes().await.map_err(|err| {
            TestaError::remote(format!("Failed to download file {file_id}: {err}"), false)
        })?;
        Ok(bytes.to_vec())
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        self.get_json(&format!("files/{file_id}"), &[]).await
    }

    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        self.get_json(&format!("assistants/{assistant_id}"), &[])
            .await
    }
}

#[derive(Deserialize)]
struct ListPage<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await.map_err(|err| {
        TestaError::remote(format!("Failed to read OpenAI response: {err}"), false)
    })?;
    serde_json::from_slice(&body).map_err(|err| TestaError::Serialization {
        format: "JSON".to_string(),
        message: format!("Failed to parse OpenAI response: {err}"),
    })
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> TestaError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    TestaError::Remote {
        status: Some(status.as_u16()),
        message,
        retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
