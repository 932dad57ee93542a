//! Minimal HTTP server standing in for the Bot API
//!
//! Replies to each request with the next scripted `(status, body)` pair and
//! records the method path and JSON body it received.
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{net::SocketAddr, sync::Arc};

use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::Mutex,
    task::JoinHandle,
};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct State {
    replies: Vec<(u16, String)>,
    requests: Vec<RecordedRequest>,
}

pub struct MockBotApi {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    handle: JoinHandle<()>,
}

impl MockBotApi {
    /// Start a server answering with `replies` in order
    pub async fn start(replies: impl IntoIterator<Item = (u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut replies: Vec<_> = replies.into_iter().collect();
        replies.reverse();
        let state = Arc::new(Mutex::new(State {
            replies,
            requests: Vec::new(),
        }));

        let handle = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move { handle_connection(stream, state).await });
                }
            })
        };

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Start a server that accepts every call
    pub async fn accepting() -> Self {
        Self::start(Vec::new()).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for MockBotApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(stream: TcpStream, state: Arc<Mutex<State>>) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
        return;
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_owned();

    let mut content_length = 0;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).await.unwrap_or(0) == 0 {
            return;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0; content_length];
    if reader.read_exact(&mut body).await.is_err() {
        return;
    }

    let (status, reply) = {
        let mut state = state.lock().await;
        state.requests.push(RecordedRequest {
            path,
            body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
        });
        state
            .replies
            .pop()
            .unwrap_or_else(|| (200, r#"{"ok":true,"result":{}}"#.to_owned()))
    };

    let response = format!(
        "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
        reply.len()
    );

    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
