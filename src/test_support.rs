// src/test_support.rs
// =============================================================================
// A tiny local HTTP server for tests, so nothing touches the real network.
//
// Routes:
//   /status/<code>[/...]  -> answers with <code>
//   /silent[/...]         -> accepts the connection and never answers
//   anything else         -> 404
//
// Also FlakyStore, a store wrapper that fails on demand.
// =============================================================================

use crate::store::{MemoryStore, StoreError, StoredUrl, UrlStore};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Starts the server and returns its base URL, e.g. "http://127.0.0.1:4242".
pub async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle(socket));
        }
    });

    format!("http://{}", addr)
}

/// A URL on a port nobody listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

async fn handle(mut socket: TcpStream) {
    let mut buf = vec![0u8; 4096];
    let n = socket.read(&mut buf).await.unwrap_or(0);
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

    if path.starts_with("/silent") {
        // Hold the socket open until the client gives up.
        let _ = socket.read(&mut buf).await;
        return;
    }

    let code: u16 = path
        .strip_prefix("/status/")
        .and_then(|rest| rest.split('/').next())
        .and_then(|code| code.parse().ok())
        .unwrap_or(404);

    let response = format!(
        "HTTP/1.1 {} Test\r\ncontent-length: 2\r\nconnection: close\r\n\r\nhi",
        code
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Wraps a `MemoryStore` with knobs for making it misbehave.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fetch_calls: AtomicUsize,
    // Fetch number (1-based) that starts failing; 0 means never.
    fail_from_fetch: AtomicUsize,
    failing_touches: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// How many range queries have been attempted.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Makes the `nth` fetch (1-based) and every one after it fail.
    pub fn fail_from_fetch(&self, nth: usize) {
        self.fail_from_fetch.store(nth, Ordering::SeqCst);
    }

    /// Makes `touch_verified` on this id fail.
    pub fn fail_touch(&self, id: impl Into<String>) {
        self.failing_touches.lock().unwrap().insert(id.into());
    }
}

#[async_trait]
impl UrlStore for FlakyStore {
    async fn fetch_after(
        &self,
        start_after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredUrl>, StoreError> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail_from = self.fail_from_fetch.load(Ordering::SeqCst);
        if fail_from != 0 && call >= fail_from {
            return Err(StoreError::Unavailable(format!("fetch #{} refused", call)));
        }
        self.inner.fetch_after(start_after, limit).await
    }

    async fn touch_verified(&self, id: &str) -> Result<(), StoreError> {
        if self.failing_touches.lock().unwrap().contains(id) {
            return Err(StoreError::Unavailable(format!("touch of {} refused", id)));
        }
        self.inner.touch_verified(id).await
    }

    async fn touch_viewed(&self, url: &str) -> Result<String, StoreError> {
        self.inner.touch_viewed(url).await
    }
}
