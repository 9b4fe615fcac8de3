//! HTTP transport for the chat endpoint.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::api::{ChatRequest, HealthResponse};
use crate::utils::url::construct_api_url;

pub const CHAT_ENDPOINT: &str = "api/chat";
pub const HEALTH_ENDPOINT: &str = "api/health";

/// Raw body chunks in arrival order. Dropping the stream releases the
/// underlying connection.
pub type ChunkStream = BoxStream<'static, Result<Bytes, TransportError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, TLS or read failure.
    Network { message: String },

    /// The backend answered outside 200–299. The body is never read.
    Status { status: u16 },

    /// The backend answered 2xx without a body that can be streamed.
    BodyUnavailable { status: u16 },

    /// A non-streaming response could not be parsed.
    InvalidResponse { message: String },
}

impl TransportError {
    fn network(err: reqwest::Error) -> Self {
        TransportError::Network {
            message: err.to_string(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network { message } => write!(f, "network error: {message}"),
            TransportError::Status { status } => write!(f, "HTTP status {status}"),
            TransportError::BodyUnavailable { status } => {
                write!(f, "HTTP status {status} carried no readable body")
            }
            TransportError::InvalidResponse { message } => {
                write!(f, "invalid response: {message}")
            }
        }
    }
}

impl StdError for TransportError {}

/// Issues a chat request and hands back the reply as a chunk stream.
///
/// Implementations must not retry and must not impose a timeout; callers
/// that need either wrap the transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &ChatRequest) -> Result<ChunkStream, TransportError>;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn chat_url(&self) -> String {
        construct_api_url(&self.base_url, CHAT_ENDPOINT)
    }

    pub fn health_url(&self) -> String {
        construct_api_url(&self.base_url, HEALTH_ENDPOINT)
    }

    /// Probes the backend's health endpoint.
    pub async fn health(&self) -> Result<HealthResponse, TransportError> {
        let url = self.health_url();
        debug!(url = %url, "Probing backend health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(TransportError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(TransportError::network)?;
        serde_json::from_str(&body).map_err(|err| TransportError::InvalidResponse {
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &ChatRequest) -> Result<ChunkStream, TransportError> {
        let url = self.chat_url();
        debug!(url = %url, message_len = request.message.len(), "Posting chat request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!(url = %url, error = %err, "Chat request failed before a response");
                TransportError::network(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Chat request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
            warn!(url = %url, status = status.as_u16(), "Chat response has no body");
            return Err(TransportError::BodyUnavailable {
                status: status.as_u16(),
            });
        }

        Ok(response
            .bytes_stream()
            .map_err(TransportError::network)
            .boxed())
    }
}
