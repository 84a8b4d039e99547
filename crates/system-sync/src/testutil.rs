//! Test-only scaffolding shared by client, export and import tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{Result, SystemSyncError};
use crate::tools::DatabaseTools;

/// In-memory stand-in for the external database tools.
#[derive(Debug, Default)]
pub(crate) struct FakeTools {
    pub dump_contents: String,
    pub fail_dump: bool,
    pub fail_restore: bool,
    pub restores: std::sync::Mutex<Vec<(String, String)>>,
}

impl FakeTools {
    pub fn with_dump(contents: &str) -> Self {
        Self {
            dump_contents: contents.to_string(),
            ..Self::default()
        }
    }

    pub fn failing_restore(contents: &str) -> Self {
        Self {
            dump_contents: contents.to_string(),
            fail_restore: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl DatabaseTools for FakeTools {
    async fn produce_dump(&self, database_url: &str, output: &Path) -> Result<()> {
        if database_url.trim().is_empty() {
            return Err(SystemSyncError::configuration(
                "Database connection string is not configured",
            ));
        }
        if self.fail_dump {
            return Err(SystemSyncError::dump("pg_dump: connection refused"));
        }
        std::fs::write(output, &self.dump_contents)?;
        Ok(())
    }

    async fn restore_dump(&self, database_url: &str, dump: &Path) -> Result<()> {
        if self.fail_restore {
            return Err(SystemSyncError::restore("psql: relation already exists"));
        }
        let contents = std::fs::read_to_string(dump)?;
        self.restores
            .lock()
            .expect("restores lock")
            .push((database_url.to_string(), contents));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

fn header_end_offset(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buffer = Vec::new();
    loop {
        let mut chunk = [0_u8; 2048];
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if header_end_offset(&buffer).is_some() {
            break;
        }
    }

    let header_end = header_end_offset(&buffer)?;
    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next()?.to_string();
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let content_length = headers
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0_u8; 2048];
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Some(CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

async fn write_http_response(
    stream: &mut tokio::net::TcpStream,
    response: &MockResponse,
) -> std::io::Result<()> {
    let payload = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        status_text(response.status),
        response.body.len(),
        response.body
    );
    stream.write_all(payload.as_bytes()).await?;
    stream.flush().await
}

/// Spawn a one-response HTTP server; every connection gets the same scripted
/// response and is captured for assertions.
pub(crate) async fn spawn_mock_server(
    response: MockResponse,
) -> (
    String,
    Arc<Mutex<Vec<CapturedRequest>>>,
    JoinHandle<()>,
) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let captured = Arc::new(Mutex::new(Vec::<CapturedRequest>::new()));
    let captured_clone = Arc::clone(&captured);

    let handle = tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(value) => value,
                Err(_) => break,
            };
            let captured_inner = Arc::clone(&captured_clone);
            let scripted = response.clone();
            tokio::spawn(async move {
                let Some(request) = read_http_request(&mut stream).await else {
                    return;
                };
                captured_inner.lock().await.push(request);
                let _ = write_http_response(&mut stream, &scripted).await;
            });
        }
    });

    (format!("http://{}", addr), captured, handle)
}
