use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::ChatRequest;
use crate::core::chat_stream::{ChunkStream, Transport, TransportError};

pub type ChunkResult = Result<Bytes, TransportError>;

/// What a [`ScriptedTransport`] answers to one `post`.
pub enum ScriptedReply {
    /// A finished body delivered chunk by chunk.
    Stream(Vec<ChunkResult>),
    /// A body fed by the test through an unbounded channel.
    Live(mpsc::UnboundedReceiver<ChunkResult>),
    Fail(TransportError),
    /// The backend never answers.
    Hang,
}

/// In-memory transport that replays scripted replies in order and records
/// every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn streaming(chunks: &[&str]) -> Self {
        Self::new([ScriptedReply::Stream(text_chunks(chunks))])
    }

    pub fn failing(err: TransportError) -> Self {
        Self::new([ScriptedReply::Fail(err)])
    }

    /// Transport whose single reply is driven through the returned sender.
    pub fn live() -> (Self, mpsc::UnboundedSender<ChunkResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new([ScriptedReply::Live(rx)]), tx)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: &ChatRequest) -> Result<ChunkStream, TransportError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let reply = self.replies.lock().expect("replies lock").pop_front();
        match reply {
            Some(ScriptedReply::Stream(chunks)) => Ok(futures_util::stream::iter(chunks).boxed()),
            Some(ScriptedReply::Live(rx)) => Ok(
                futures_util::stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|chunk| (chunk, rx))
                })
                .boxed(),
            ),
            Some(ScriptedReply::Fail(err)) => Err(err),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Err(TransportError::Network {
                message: "no scripted reply left".to_string(),
            }),
        }
    }
}

pub fn text_chunks(chunks: &[&str]) -> Vec<ChunkResult> {
    chunks
        .iter()
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
        .collect()
}

/// Request captured by [`spawn_http_stub`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

/// Serves `response` verbatim to the first connection on a loopback port.
/// Returns the base URL and a handle resolving to the captured request.
pub async fn spawn_http_stub(response: &'static str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buffer = Vec::new();
        let mut scratch = [0_u8; 4096];

        let header_end = loop {
            let read = socket.read(&mut scratch).await.expect("read request");
            assert!(read > 0, "client closed before sending headers");
            buffer.extend_from_slice(&scratch[..read]);
            if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buffer.len() < header_end + content_length {
            let read = socket.read(&mut scratch).await.expect("read body");
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&scratch[..read]);
        }

        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        socket.shutdown().await.ok();

        CapturedRequest {
            head,
            body: String::from_utf8_lossy(&buffer[header_end..]).to_string(),
        }
    });

    (format!("http://{addr}"), handle)
}

/// Base URL of a loopback port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}
