//! Shared helpers for integration tests

use quill::error::CallError;
use quill::generation::{GenerationOrchestrator, GenerationRequest, InvokePolicy};
use quill::provider::{ReplayBackend, ReplayStep};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// Serializes tests that touch process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// Sets environment variables for the lifetime of the guard, restoring them on drop.
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    pub fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
        let saved = vars
            .iter()
            .map(|(name, _)| (*name, std::env::var(name).ok()))
            .collect();
        for (name, value) in vars {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Policy without backoff delays so retry paths run instantly
pub fn fast_policy() -> InvokePolicy {
    InvokePolicy {
        call_timeout: Duration::from_secs(5),
        max_transient_retries: 2,
        retry_base_delay: Duration::ZERO,
    }
}

pub fn replay(steps: Vec<ReplayStep>) -> Arc<ReplayBackend> {
    Arc::new(ReplayBackend::new(steps))
}

pub fn orchestrator(backend: Arc<ReplayBackend>) -> GenerationOrchestrator {
    GenerationOrchestrator::new(backend).with_policy(fast_policy())
}

pub fn respond(text: &str) -> ReplayStep {
    ReplayStep::Respond(json!({ "output_text": text }))
}

pub fn fail(status: u16, message: &str) -> ReplayStep {
    ReplayStep::Fail(CallError::with_status(status, message))
}

pub fn not_found() -> ReplayStep {
    fail(404, "The model does not exist or you do not have access to it")
}

pub fn request(candidates: &[&str]) -> GenerationRequest {
    GenerationRequest::new(
        candidates.iter().map(|c| c.to_string()).collect(),
        "You write short social posts.",
    )
    .turn("Write a post about morning routines")
}

/// A canned HTTP answer served by [`serve_responses`].
pub struct CannedResponse {
    pub status: u16,
    pub body: Value,
}

impl CannedResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": { "message": message } }),
        }
    }
}

/// Serve the given responses, one per connection, on a local port.
///
/// Returns the base URL and a handle resolving to the request bodies received.
pub async fn serve_responses(
    responses: Vec<CannedResponse>,
) -> (String, tokio::task::JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut bodies = Vec::new();
        for canned in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            bodies.push(read_request_body(&mut socket).await);

            let payload = canned.body.to_string();
            let reply = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                canned.status,
                payload.len(),
                payload
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
        bodies
    });

    (format!("http://{}/v1", addr), handle)
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> Value {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let Some(header_end) = find_header_end(&buffer) else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buffer.len() >= body_start + content_length {
            return serde_json::from_slice(&buffer[body_start..body_start + content_length])
                .unwrap_or(Value::Null);
        }
    }
    Value::Null
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}
