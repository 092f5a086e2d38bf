//! HTTP adapter for the council backend.
//!
//! One [`HttpCouncilClient`] implements every backend port:
//!
//! | Port | Endpoint |
//! |---|---|
//! | [`ConversationRepository`] | `GET/POST /api/conversations`, `GET /api/conversations/{id}` |
//! | [`StreamClient`] | `POST /api/conversations/{id}/message/stream` (SSE) |
//! | [`SettingsStore`] | `GET/PUT /api/settings` |
//! | [`ModelCatalog`] | `GET /api/models` |

use super::sse::{SseDecoder, SseFrame};
use async_trait::async_trait;
use council_application::{
    CatalogError, ConversationRepository, ModelCatalog, RepositoryError, SettingsStore,
    SettingsStoreError, StreamClient, StreamError, StreamHandle, StreamItem,
};
use council_domain::{
    Conversation, ConversationId, ConversationSummary, ModelCatalogSnapshot, Settings,
};
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events buffered between the body reader and the turn controller
const STREAM_BUFFER: usize = 32;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid backend URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            HttpError::Decode(e.to_string())
        } else {
            HttpError::Connection(e.to_string())
        }
    }
}

impl From<HttpError> for RepositoryError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Connection(msg) => RepositoryError::Connection(msg),
            HttpError::Decode(msg) => RepositoryError::InvalidResponse(msg),
            other => RepositoryError::RequestFailed(other.to_string()),
        }
    }
}

impl From<HttpError> for SettingsStoreError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Status { status, detail }
                if status == StatusCode::BAD_REQUEST
                    || status == StatusCode::UNPROCESSABLE_ENTITY =>
            {
                SettingsStoreError::Rejected(detail)
            }
            HttpError::Connection(msg) => SettingsStoreError::Connection(msg),
            other => SettingsStoreError::Storage(other.to_string()),
        }
    }
}

impl From<HttpError> for CatalogError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Decode(msg) => CatalogError::InvalidData(msg),
            other => CatalogError::Unavailable(other.to_string()),
        }
    }
}

/// Client for the council backend's REST and streaming API.
#[derive(Clone)]
pub struct HttpCouncilClient {
    client: Client,
    base_url: Url,
    request_timeout: Option<Duration>,
    idle_timeout: Option<Duration>,
}

impl HttpCouncilClient {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let base_url =
            Url::parse(base_url).map_err(|_| HttpError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(HttpError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url,
            request_timeout: None,
            idle_timeout: None,
        })
    }

    /// Timeout for non-streaming requests.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Longest silence tolerated between two chunks of a turn stream.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self.client.request(method, self.url(segments));
        match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, HttpError> {
        let response = checked(builder.send().await?).await?;
        response.json::<T>().await.map_err(|e| HttpError::Decode(e.to_string()))
    }
}

/// Turn a non-2xx response into [`HttpError::Status`].
async fn checked(response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HttpError::Status {
        status,
        detail: error_detail(&body),
    })
}

/// The backend reports errors as `{"detail": ...}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .map(|detail| match detail {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl ConversationRepository for HttpCouncilClient {
    async fn create(&self) -> Result<Conversation, RepositoryError> {
        let conversation: Conversation = self
            .send_json(self.request(Method::POST, &["api", "conversations"]).json(&json!({})))
            .await?;
        info!("Backend created conversation {}", conversation.id);
        Ok(conversation)
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, RepositoryError> {
        Ok(self
            .send_json(self.request(Method::GET, &["api", "conversations"]))
            .await?)
    }

    async fn load(&self, id: &ConversationId) -> Result<Conversation, RepositoryError> {
        let request = self.request(Method::GET, &["api", "conversations", id.as_str()]);
        match self.send_json(request).await {
            Ok(conversation) => Ok(conversation),
            Err(HttpError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(RepositoryError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StreamClient for HttpCouncilClient {
    async fn open(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<StreamHandle, StreamError> {
        let url = self.url(&[
            "api",
            "conversations",
            conversation_id.as_str(),
            "message",
            "stream",
        ]);
        debug!("Opening stream {}", url);

        // The request timeout would also cut the streaming body, so only
        // the wait for response headers is bounded here.
        let send = self
            .client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&json!({ "content": content }))
            .send();
        let sent = match self.request_timeout.or(self.idle_timeout) {
            Some(limit) => tokio::time::timeout(limit, send).await.map_err(|_| {
                warn!("No response to stream request within {:?}", limit);
                StreamError::Timeout
            })?,
            None => send.await,
        };
        let response = sent.map_err(|e| StreamError::Open(e.to_string()))?;
        let response = checked(response)
            .await
            .map_err(|e| StreamError::Open(e.to_string()))?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(forward_events(response, tx, self.idle_timeout));
        Ok(StreamHandle::new(rx))
    }
}

/// Read the SSE body and forward decoded events until a terminal event,
/// a transport error, end of body, or the receiver going away.
async fn forward_events(
    response: Response,
    tx: mpsc::Sender<StreamItem>,
    idle_timeout: Option<Duration>,
) {
    let mut body = Box::pin(response.bytes_stream());
    let mut decoder = SseDecoder::new();

    loop {
        let next = async {
            match idle_timeout {
                Some(limit) => tokio::time::timeout(limit, body.next())
                    .await
                    .map_err(|_| StreamError::Timeout),
                None => Ok(body.next().await),
            }
        };
        let chunk = tokio::select! {
            _ = tx.closed() => {
                debug!("Stream receiver dropped, aborting");
                return;
            }
            chunk = next => chunk,
        };

        match chunk {
            Ok(Some(Ok(bytes))) => {
                if !forward_frames(&tx, decoder.push(&bytes)).await {
                    return;
                }
            }
            Ok(Some(Err(e))) => {
                warn!("Stream body error: {}", e);
                let _ = tx.send(Err(StreamError::Connection(e.to_string()))).await;
                return;
            }
            Ok(None) => {
                forward_frames(&tx, decoder.finish().into_iter().collect()).await;
                debug!("Stream body ended");
                return;
            }
            Err(timeout) => {
                warn!("Stream idle for longer than {:?}", idle_timeout);
                let _ = tx.send(Err(timeout)).await;
                return;
            }
        }
    }
}

/// Send decoded frames in order. Returns `false` once the stream is over
/// (terminal event, decode failure, or receiver gone).
async fn forward_frames(tx: &mpsc::Sender<StreamItem>, frames: Vec<SseFrame>) -> bool {
    for frame in frames {
        let item = frame.decode();
        let terminal = match &item {
            Ok(event) => event.is_terminal(),
            Err(e) => {
                warn!("Undecodable stream frame: {}", e);
                true
            }
        };
        if tx.send(item).await.is_err() || terminal {
            return false;
        }
    }
    true
}

#[async_trait]
impl SettingsStore for HttpCouncilClient {
    async fn get(&self) -> Result<Settings, SettingsStoreError> {
        Ok(self
            .send_json(self.request(Method::GET, &["api", "settings"]))
            .await?)
    }

    async fn save(&self, settings: &Settings) -> Result<Settings, SettingsStoreError> {
        Ok(self
            .send_json(self.request(Method::PUT, &["api", "settings"]).json(settings))
            .await?)
    }
}

#[async_trait]
impl ModelCatalog for HttpCouncilClient {
    async fn list_models(&self, force_refresh: bool) -> Result<ModelCatalogSnapshot, CatalogError> {
        let mut request = self.request(Method::GET, &["api", "models"]);
        if force_refresh {
            request = request.query(&[("refresh", "true")]);
        }
        Ok(self.send_json(request).await?)
    }
}
