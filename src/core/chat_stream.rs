use async_trait::async_trait;
use futures_util::StreamExt;
use std::error::Error as StdError;
use std::fmt;

use crate::api::models::fetch_models;
use crate::api::ChatRequest;
use crate::core::transport::ByteStream;
use crate::utils::url::construct_api_url;

/// Failures that abort a chat request.
#[derive(Debug)]
pub enum StreamError {
    /// The response carried no readable body.
    TransportUnavailable,
    /// The endpoint answered with a non-success status.
    RequestFailed { status: u16, body: String },
    /// Connecting or reading the body failed.
    Network(reqwest::Error),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::TransportUnavailable => write!(f, "response has no readable body"),
            StreamError::RequestFailed { status, body } => {
                if body.trim().is_empty() {
                    write!(f, "chat request failed with HTTP {status}")
                } else {
                    write!(f, "chat request failed with HTTP {status}: {}", body.trim())
                }
            }
            StreamError::Network(err) => write!(f, "network error: {err}"),
        }
    }
}

impl StdError for StreamError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StreamError::Network(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        StreamError::Network(err)
    }
}

/// Opens streaming chat responses against the model endpoint.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Issue the request and hand back the body once headers arrive.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError>;

    /// Names of the models the endpoint can serve.
    async fn list_models(&self) -> Result<Vec<String>, String>;
}

#[derive(Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatTransport {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError> {
        let chat_url = construct_api_url(&self.base_url, "chat");
        let response = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(StreamError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        if response.content_length() == Some(0) {
            return Err(StreamError::TransportUnavailable);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from));
        Ok(Box::pin(body))
    }

    async fn list_models(&self) -> Result<Vec<String>, String> {
        fetch_models(&self.client, &self.base_url)
            .await
            .map_err(|err| err.to_string())
    }
}
