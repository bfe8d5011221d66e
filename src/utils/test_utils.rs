//! Shared fixtures for unit tests: a scripted HTTP server, a scripted chat
//! transport, a recording clipboard, and an app builder.

use async_trait::async_trait;
use futures_util::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;

use crate::api::ChatRequest;
use crate::core::app::{ChatApp, SessionEvent};
use crate::core::chat_stream::{ChatTransport, StreamError};
use crate::core::store::memory::MemoryStore;
use crate::core::store::ConversationStore;
use crate::core::transport::ByteStream;
use crate::utils::clipboard::Clipboard;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    chunks: Vec<String>,
    chunked: bool,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            chunks: vec![body.to_string()],
            chunked: false,
        }
    }

    /// Body sent with `Transfer-Encoding: chunked`, one HTTP chunk per entry.
    pub fn chunked(status: u16, chunks: Vec<&str>) -> Self {
        Self {
            status,
            chunks: chunks.into_iter().map(str::to_string).collect(),
            chunked: true,
        }
    }
}

pub struct MockServer {
    port: u16,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockServer {
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/api", self.port)
    }

    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }
}

/// Serve `responses` in order, one connection each.
pub async fn spawn_http_server(responses: Vec<MockResponse>) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let port = listener.local_addr().expect("local addr").port();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let captured_for_server = Arc::clone(&captured);

    tokio::spawn(async move {
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let Ok(request) = read_http_request(&mut socket).await else {
                return;
            };
            captured_for_server.lock().await.push(request);
            let _ = write_response(&mut socket, &response).await;
            let _ = socket.shutdown().await;
        }
    });

    MockServer { port, captured }
}

async fn write_response(socket: &mut TcpStream, response: &MockResponse) -> std::io::Result<()> {
    let reason = if response.status < 400 { "OK" } else { "Error" };
    if response.chunked {
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/x-ndjson\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
            response.status, reason
        );
        socket.write_all(head.as_bytes()).await?;
        for chunk in &response.chunks {
            let frame = format!("{:x}\r\n{}\r\n", chunk.len(), chunk);
            socket.write_all(frame.as_bytes()).await?;
            socket.flush().await?;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        socket.write_all(b"0\r\n\r\n").await?;
    } else {
        let body = response.chunks.concat();
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            response.status,
            reason,
            body.len()
        );
        socket.write_all(head.as_bytes()).await?;
        socket.write_all(body.as_bytes()).await?;
    }
    socket.flush().await
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.unwrap_or(buffer.len());
    let header_text = std::str::from_utf8(&buffer[..header_end]).map_err(|e| e.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|e| e.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length - body.len()];
        let read = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

/// What the scripted transport does for one request.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Chunks(Vec<String>),
    /// Yield these chunks, then fail the body read.
    ChunksThenError(Vec<String>),
    Status(u16),
    /// Wait for the gate before yielding each chunk.
    Gated(Vec<String>, Arc<tokio::sync::Semaphore>),
}

/// In-process [`ChatTransport`] replaying scripted replies in order.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: std::sync::Mutex<std::collections::VecDeque<ScriptedReply>>,
    requests: std::sync::Mutex<Vec<ChatRequest>>,
    models: Option<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            requests: std::sync::Mutex::new(Vec::new()),
            models: None,
        }
    }

    /// Serve `models` from `list_models`; without this the listing fails.
    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Some(models.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests
            .lock()
            .map(|requests| {
                requests
                    .iter()
                    .map(|request| {
                        (
                            request.model.clone(),
                            request
                                .messages
                                .iter()
                                .map(|m| (m.role.clone(), m.content.clone()))
                                .collect(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(ChatRequest {
                model: request.model.clone(),
                messages: request.messages.clone(),
                stream: request.stream,
            });
        }
        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or(ScriptedReply::Status(500));

        match reply {
            ScriptedReply::Status(status) => Err(StreamError::RequestFailed {
                status,
                body: String::new(),
            }),
            ScriptedReply::Chunks(chunks) => {
                let items: Vec<Result<Vec<u8>, StreamError>> =
                    chunks.into_iter().map(|c| Ok(c.into_bytes())).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            ScriptedReply::ChunksThenError(chunks) => {
                let mut items: Vec<Result<Vec<u8>, StreamError>> =
                    chunks.into_iter().map(|c| Ok(c.into_bytes())).collect();
                items.push(Err(StreamError::TransportUnavailable));
                Ok(Box::pin(stream::iter(items)))
            }
            ScriptedReply::Gated(chunks, gate) => {
                let body = stream::unfold(
                    (chunks.into_iter(), gate),
                    |(mut chunks, gate)| async move {
                        let chunk = chunks.next()?;
                        let permit = gate.acquire().await.ok()?;
                        permit.forget();
                        Some((Ok(chunk.into_bytes()), (chunks, gate)))
                    },
                );
                Ok(Box::pin(body))
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, String> {
        self.models
            .clone()
            .ok_or_else(|| "model listing unavailable".to_string())
    }
}

/// Clipboard that records writes, or fails every write.
#[derive(Default)]
pub struct RecordingClipboard {
    pub fail: bool,
    pub writes: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), String> {
        if self.fail {
            return Err("clipboard unavailable".to_string());
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(text.to_string());
        }
        Ok(())
    }
}

pub fn ndjson(fragments: &[&str]) -> String {
    fragments
        .iter()
        .map(|fragment| {
            format!(
                "{}\n",
                serde_json::json!({ "message": { "role": "assistant", "content": fragment } })
            )
        })
        .collect()
}

pub struct TestApp {
    pub app: ChatApp,
    pub events: UnboundedReceiver<SessionEvent>,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub clipboard: Arc<RecordingClipboard>,
}

pub fn create_test_app(replies: Vec<ScriptedReply>) -> TestApp {
    create_test_app_with(
        MemoryStore::new(),
        ScriptedTransport::new(replies),
        RecordingClipboard::default(),
    )
}

pub fn create_test_app_with(
    store: MemoryStore,
    transport: ScriptedTransport,
    clipboard: RecordingClipboard,
) -> TestApp {
    let store = Arc::new(store);
    let transport = Arc::new(transport);
    let clipboard = Arc::new(clipboard);
    let (app, events) = ChatApp::new(
        Arc::clone(&store) as Arc<dyn ConversationStore>,
        Arc::clone(&transport) as Arc<dyn ChatTransport>,
        Arc::clone(&clipboard) as Arc<dyn Clipboard>,
        "test-model",
    );
    TestApp {
        app,
        events,
        store,
        transport,
        clipboard,
    }
}
