//! Minimal HTTP/1.1 server serving scripted JSON responses for integration
//! tests.
//!
//! A handler closure decides each response from the request method, path,
//! and how many times that path has been hit before, so tests can script
//! fail-then-succeed sequences and rate-limit headers.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One canned response.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Scripted {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// What the server has seen so far.
#[derive(Default)]
pub struct ServerState {
    /// Requests received, counted per path.
    pub hits: Mutex<HashMap<String, usize>>,
}

impl ServerState {
    pub fn hits_for(&self, path: &str) -> usize {
        *self.hits.lock().unwrap().get(path).unwrap_or(&0)
    }
}

/// Starts a server in a background thread. The handler receives
/// `(method, path, nth_hit_for_path)` with `nth` 0-based. Returns the base
/// URL (e.g. "http://127.0.0.1:12345/") and the shared state. The server
/// runs until the process exits.
pub fn start<H>(handler: H) -> (String, Arc<ServerState>)
where
    H: Fn(&str, &str, usize) -> Scripted + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let handler = Arc::new(handler);
    let state = Arc::new(ServerState::default());
    let accept_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let handler = Arc::clone(&handler);
            let state = Arc::clone(&accept_state);
            thread::spawn(move || handle(stream, &*handler, &state));
        }
    });
    (format!("http://127.0.0.1:{}/", port), state)
}

fn handle<H>(mut stream: std::net::TcpStream, handler: &H, state: &ServerState)
where
    H: Fn(&str, &str, usize) -> Scripted,
{
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let Some((method, path)) = read_request(&mut stream) else {
        return;
    };

    let nth = {
        let mut hits = state.hits.lock().unwrap();
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count - 1
    };

    let scripted = handler(&method, &path, nth);
    let mut extra = String::new();
    for (name, value) in &scripted.headers {
        extra.push_str(&format!("{}: {}\r\n", name, value));
    }
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        scripted.status,
        reason(scripted.status),
        scripted.body.len(),
        extra
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(scripted.body.as_bytes());
}

/// Reads one request (headers plus any Content-Length body) and returns
/// `(method, path)`.
fn read_request(stream: &mut std::net::TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    // Drain the body so the client finishes writing before we respond.
    let mut body_read = buf.len() - (header_end + 4);
    while body_read < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body_read += n;
    }

    Some((method, path))
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
