//! Shared utilities for relay integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hyper::header::{HeaderValue, AUTHORIZATION};
use hyper::Response;
use ntlm_relay::transport::{OutboundRequest, RelayBody};
use ntlm_relay::{CredentialSet, NtlmConnector, Transport, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A canned upstream reply.
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: &'static str,
}

impl Reply {
    pub fn ok(body: &'static str) -> Self {
        Self { status: 200, headers: Vec::new(), body }
    }

    pub fn ntlm_challenge() -> Self {
        Self {
            status: 401,
            headers: vec![("WWW-Authenticate", "NTLM TlRMTVNTUAACAAAADAAMADgAAAA")],
            body: "Unauthorized",
        }
    }
}

/// A request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub head: String,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// Start an upstream on an ephemeral port that answers request `n` with `script(n)`.
pub async fn start_scripted_backend<F>(script: F) -> (SocketAddr, Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn(usize) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let counter = Arc::new(AtomicUsize::new(0));
    let script = Arc::new(script);

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let script = script.clone();
                    let log = log.clone();
                    let counter = counter.clone();
                    tokio::spawn(async move {
                        serve_one(socket, |recorded| {
                            log.lock().unwrap().push(recorded);
                            script(counter.fetch_add(1, Ordering::SeqCst))
                        })
                        .await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

async fn serve_one<F>(mut socket: TcpStream, respond: F)
where
    F: FnOnce(Recorded) -> Reply,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut recorded = Recorded { head, body: Vec::new() };
    let content_length = recorded
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }
    recorded.body = body;

    let reply = respond(recorded);
    let reason = match reply.status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let mut response = format!("HTTP/1.1 {} {}\r\n", reply.status, reason);
    for (name, value) in &reply.headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.body.len(),
        reply.body
    ));
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Stand-in for an NTLM library: stamps an Authorization header on every
/// round trip and counts how many transports were built.
#[derive(Default)]
pub struct StampingConnector {
    pub built: AtomicUsize,
}

impl NtlmConnector for StampingConnector {
    fn connect(&self, base: Arc<dyn Transport>, credentials: &CredentialSet) -> Arc<dyn Transport> {
        self.built.fetch_add(1, Ordering::SeqCst);
        Arc::new(Stamping {
            base,
            token: format!("NTLM {}\\{}", credentials.domain(), credentials.username()),
        })
    }
}

struct Stamping {
    base: Arc<dyn Transport>,
    token: String,
}

#[async_trait]
impl Transport for Stamping {
    async fn round_trip(&self, mut request: OutboundRequest) -> Result<Response<RelayBody>, TransportError> {
        if let Ok(value) = HeaderValue::from_str(&self.token) {
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        self.base.round_trip(request).await
    }
}
