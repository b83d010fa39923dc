use std::env;
use std::time::Instant;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{ChatRequest, ChatResponse, HistoryEntry, HistoryResponse, SessionCreated};

/// Base URL used when neither an explicit URL nor `RAGCHAT_API_URL` is given.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/";

/// Environment variable consulted for the backend base URL.
pub const API_URL_ENV: &str = "RAGCHAT_API_URL";

/// The operations the widget needs from the chat backend.
///
/// Implementations do not enforce deadlines; the widget wraps every call in its own timeout and
/// drops the future when it elapses.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// `GET /api/health`; any success status means healthy.
    async fn health(&self) -> Result<()>;

    /// `POST /api/sessions`; returns the new session identifier.
    async fn create_session(&self) -> Result<String>;

    /// `GET /api/sessions/{id}/history`.
    async fn history(&self, session_id: &str) -> Result<Vec<HistoryEntry>>;

    /// `POST /api/chat/{id}` with `{ message }`.
    async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse>;

    /// `DELETE /api/sessions/{id}/history`.
    async fn clear_history(&self, session_id: &str) -> Result<()>;
}

/// HTTP client for the retrieval-augmented chat backend.
#[derive(Debug, Clone)]
pub struct RagClient {
    client: ReqwestClient,
    base_url: Url,
}

impl RagClient {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the RAGCHAT_API_URL environment
    /// variable; otherwise [`DEFAULT_API_URL`] is used.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = Url::parse(&base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::validation(
                format!("{base_url} cannot be used as a base URL"),
                Some("base_url".to_string()),
            ));
        }

        let client = ReqwestClient::builder()
            .default_headers(Self::default_headers())
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self { client, base_url })
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Build an endpoint URL from path segments.  Segments are percent-encoded, so a session
    /// identifier can never escape its path component.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url(format!("{} cannot be a base", self.base_url), None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                Error::timeout(format!("Request timed out: {}", e), None)
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;
        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Process backend error responses and convert them to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let path = response.url().path().to_string();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<String>,
            message: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error.or(e.message))
            .unwrap_or(error_body);

        match status_code {
            404 => Error::not_found(error_message, Some(path)),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_message),
        }
    }
}

#[async_trait::async_trait]
impl ChatBackend for RagClient {
    async fn health(&self) -> Result<()> {
        let url = self.endpoint(&["api", "health"])?;
        self.execute(self.client.get(url)).await?;
        Ok(())
    }

    async fn create_session(&self) -> Result<String> {
        let url = self.endpoint(&["api", "sessions"])?;
        let response = self.execute(self.client.post(url)).await?;
        let created: SessionCreated = Self::parse(response).await?;
        if created.session_id.is_empty() {
            return Err(Error::validation(
                "backend returned an empty session id",
                Some("sessionId".to_string()),
            ));
        }
        Ok(created.session_id)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<HistoryEntry>> {
        let url = self.endpoint(&["api", "sessions", session_id, "history"])?;
        let response = self.execute(self.client.get(url)).await?;
        let history: HistoryResponse = Self::parse(response).await?;
        Ok(history.history)
    }

    async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse> {
        let url = self.endpoint(&["api", "chat", session_id])?;
        let body = ChatRequest {
            message: message.to_string(),
        };
        let response = self.execute(self.client.post(url).json(&body)).await?;
        Self::parse(response).await
    }

    async fn clear_history(&self, session_id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "sessions", session_id, "history"])?;
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }
}
