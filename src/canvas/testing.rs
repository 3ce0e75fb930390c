//! Scripted Canvas stand-in served on a local socket.
//!
//! Tests that need to observe what actually reaches the wire (retry
//! counts, repeated query keys, bearer headers) point a real client at
//! this listener instead of mocking the HTTP layer away.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Handle to a running local upstream.
pub struct Upstream {
    /// Base URL to hand to the client as `institute_url`
    pub base: String,
    /// Number of requests served so far
    pub hits: Arc<AtomicUsize>,
    /// Request heads in arrival order
    pub requests: Arc<Mutex<Vec<String>>>,
}

/// Spawn a listener answering every request with `route(path)`.
///
/// Responses carry `connection: close`, so each client attempt opens a
/// fresh connection and the hit count equals the request count.
pub async fn spawn_upstream(route: fn(&str) -> String) -> Upstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let counter = Arc::clone(&hits);
    let log = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let head = read_head(&mut socket).await;
            let path = request_path(&head);
            log.lock().unwrap().push(head);
            let _ = socket.write_all(route(&path).as_bytes()).await;
        }
    });

    Upstream {
        base,
        hits,
        requests,
    }
}

/// A 200 response carrying a JSON body
pub fn json_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// An empty-bodied response with the given status line, e.g. `503 Service Unavailable`
pub fn status_response(status: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        status
    )
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Path component of the request line, query string stripped
fn request_path(head: &str) -> String {
    head.split_whitespace()
        .nth(1)
        .unwrap_or("")
        .split('?')
        .next()
        .unwrap_or("")
        .to_string()
}
