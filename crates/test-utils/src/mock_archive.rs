//! In-process stand-in for the NOMADS archive.
//!
//! Each path gets a script of responses that are served in order; the last
//! response repeats once the script runs out. Files registered with
//! [`MockResponse::file`] honor the `Range` header the way the archive does,
//! returning the requested slices concatenated with status 206.
//!
//! ```ignore
//! let archive = MockArchive::start().await;
//! archive.respond("/data.idx", vec![MockResponse::text(GFS_F006_IDX)]);
//! archive.respond("/data", vec![MockResponse::empty(), MockResponse::file(payload())]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::task::JoinHandle;

/// A scripted reply for one request.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    body: Vec<u8>,
    serve_ranges: bool,
    delay: Option<Duration>,
}

impl MockResponse {
    /// 200 with a text body, ignoring any `Range` header.
    pub fn text(body: &str) -> Self {
        Self::bytes(200, body.as_bytes().to_vec())
    }

    /// A whole file; `Range` requests get the matching slices with 206.
    pub fn file(body: Vec<u8>) -> Self {
        Self {
            serve_ranges: true,
            ..Self::bytes(200, body)
        }
    }

    /// 200 with an empty body.
    pub fn empty() -> Self {
        Self::bytes(200, Vec::new())
    }

    /// A bare status code with an empty body.
    pub fn status(code: u16) -> Self {
        Self::bytes(code, Vec::new())
    }

    /// A status code with a body (e.g. an HTML error page).
    pub fn bytes(code: u16, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::from_u16(code).expect("valid status code"),
            body,
            serve_ranges: false,
            delay: None,
        }
    }

    /// Wait before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct ArchiveState {
    scripts: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    hits: Mutex<HashMap<String, usize>>,
    ranges: Mutex<HashMap<String, Vec<String>>>,
}

/// A running mock archive bound to an ephemeral localhost port.
pub struct MockArchive {
    addr: SocketAddr,
    state: Arc<ArchiveState>,
    handle: JoinHandle<()>,
}

impl MockArchive {
    /// Bind to `127.0.0.1:0` and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(ArchiveState::default());
        let app = Router::new()
            .fallback(archive_handler)
            .layer(Extension(state.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock archive");
        let addr = listener.local_addr().expect("Mock archive has no address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Root URL of the archive, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the response script for `path`.
    pub fn respond(&self, path: &str, script: Vec<MockResponse>) {
        assert!(!script.is_empty(), "response script must not be empty");
        self.state
            .scripts
            .lock()
            .unwrap()
            .insert(path.to_string(), script.into());
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// `Range` header values received for `path`, in arrival order.
    pub fn range_headers(&self, path: &str) -> Vec<String> {
        self.state
            .ranges
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }
}

impl Drop for MockArchive {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn archive_handler(
    Extension(state): Extension<Arc<ArchiveState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_string();
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    *state.hits.lock().unwrap().entry(path.clone()).or_default() += 1;
    if let Some(range) = &range {
        state
            .ranges
            .lock()
            .unwrap()
            .entry(path.clone())
            .or_default()
            .push(range.clone());
    }

    let reply = {
        let mut scripts = state.scripts.lock().unwrap();
        match scripts.get_mut(&path) {
            Some(script) if script.len() > 1 => script.pop_front(),
            Some(script) => script.front().cloned(),
            None => None,
        }
    };

    let Some(reply) = reply else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    match (reply.serve_ranges, range) {
        (true, Some(range)) => match slice_ranges(&reply.body, &range) {
            Some(body) => (StatusCode::PARTIAL_CONTENT, body).into_response(),
            None => StatusCode::RANGE_NOT_SATISFIABLE.into_response(),
        },
        _ => (reply.status, reply.body).into_response(),
    }
}

/// Concatenate the inclusive slices named by a `bytes=a-b,c-` header.
fn slice_ranges(body: &[u8], header_value: &str) -> Option<Vec<u8>> {
    let ranges = header_value.strip_prefix("bytes=")?;
    let mut out = Vec::new();

    for part in ranges.split(',') {
        let (begin, end) = part.trim().split_once('-')?;
        let begin: usize = begin.parse().ok()?;
        let last = body.len().checked_sub(1)?;
        let end = if end.is_empty() {
            last
        } else {
            end.parse::<usize>().ok()?.min(last)
        };
        if begin > end {
            return None;
        }
        out.extend_from_slice(&body[begin..=end]);
    }

    Some(out)
}
