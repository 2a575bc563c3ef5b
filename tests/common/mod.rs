//! Shared utilities for integration testing.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use geod_balance::config::{AppConfig, PolygonscanConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::dispatcher::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const WALLET: &str = "0x1234567890abcdef1234567890abcdef12345678";

/// Start a programmable mock explorer on an ephemeral port.
///
/// The handler receives the request target (path and query string) and
/// returns the status code and body to send back.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let target = read_request_target(&mut socket).await;
                let (status, body) = f(target).await;
                let status_text = match status {
                    200 => "200 OK",
                    403 => "403 Forbidden",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response_str = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a mock explorer that always answers with the same response.
#[allow(dead_code)]
pub async fn start_mock_backend(status: u16, body: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| async move { (status, body.to_string()) }).await
}

/// Read request headers and return the request target of the first line.
async fn read_request_target(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let head = String::from_utf8_lossy(&buf);
    head.split_whitespace().nth(1).unwrap_or_default().to_string()
}

/// Explorer settings pointing at a mock backend.
pub fn polygonscan_config(addr: SocketAddr) -> PolygonscanConfig {
    PolygonscanConfig {
        api_url: format!("http://{}/api", addr),
        request_timeout_secs: 1,
        ..PolygonscanConfig::default()
    }
}

#[allow(dead_code)]
pub fn app_config(addr: SocketAddr) -> AppConfig {
    AppConfig {
        polygonscan: polygonscan_config(addr),
        ..AppConfig::default()
    }
}

/// Explorer success envelope for a raw token amount.
pub fn ok_body(raw: &str) -> String {
    format!(r#"{{"status":"1","message":"OK","result":"{}"}}"#, raw)
}

#[allow(dead_code)]
pub fn error_body(message: &str) -> String {
    format!(r#"{{"status":"0","message":"{}","result":"Invalid API Key"}}"#, message)
}

/// Log output collected by [`capture_logs`].
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

#[allow(dead_code)]
impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Record every event on the current thread until the guard is dropped.
///
/// Only valid with the default current-thread `#[tokio::test]` runtime, where
/// spawned tasks run on the test thread.
#[allow(dead_code)]
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
