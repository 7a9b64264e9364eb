//! Per-call request description

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures::{StreamExt, stream};
use reqwest::Method;
use serde_json::{Map, Value};

use super::multipart::FilePart;

/// Size of the slices a progress-reporting body is written in
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Body-write progress of one request attempt
///
/// For multipart uploads both counts cover part contents only, not the
/// boundaries and part headers around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes handed to the transport so far
    pub loaded: u64,
    /// Full body size when known
    pub total: Option<u64>,
}

/// Callback invoked as the body is written
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Running byte count of one attempt, shared by every body it writes
#[derive(Clone)]
pub(crate) struct ProgressTracker {
    loaded: Arc<AtomicU64>,
    total: u64,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            loaded: Arc::new(AtomicU64::new(0)),
            total,
            callback,
        }
    }

    /// Stream `content` in slices, reporting each slice as the transport takes it
    pub(crate) fn body(&self, content: Bytes) -> reqwest::Body {
        let chunks: Vec<Bytes> = (0..content.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| content.slice(start..(start + UPLOAD_CHUNK_SIZE).min(content.len())))
            .collect();

        let tracker = self.clone();
        let stream = stream::iter(chunks).map(move |chunk| {
            tracker.advance(chunk.len() as u64);
            Ok::<_, std::io::Error>(chunk)
        });

        reqwest::Body::wrap_stream(stream)
    }

    fn advance(&self, written: u64) {
        let loaded = self.loaded.fetch_add(written, Ordering::SeqCst) + written;
        (self.callback)(UploadProgress {
            loaded,
            total: Some(self.total),
        });
    }
}

/// Everything the gateway needs to issue one call
///
/// `url` is a path relative to the configured base. The method defaults to
/// `POST`. With `file` set, `data` and `attachments` are sent as
/// multipart/form-data to the file-transfer base instead of JSON to the API
/// base.
#[derive(Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub data: Map<String, Value>,
    pub attachments: Vec<(String, FilePart)>,
    pub on_upload_progress: Option<ProgressCallback>,
    pub file: bool,
}

impl RequestDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            headers: Vec::new(),
            params: Vec::new(),
            data: Map::new(),
            attachments: Vec::new(),
            on_upload_progress: None,
            file: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::GET)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::PUT)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::PATCH)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::DELETE)
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Set one body field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Replace the whole body
    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Attach a binary part; implies a multipart upload
    pub fn attach(mut self, key: impl Into<String>, file: FilePart) -> Self {
        self.attachments.push((key.into(), file));
        self.file = true;
        self
    }

    /// Send as multipart/form-data to the file-transfer base
    pub fn file(mut self, file: bool) -> Self {
        self.file = file;
        self
    }

    pub fn on_upload_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.on_upload_progress = Some(Arc::new(callback));
        self
    }

    /// Whether a JSON body goes out for this method
    pub(crate) fn carries_json_body(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD)
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers.len())
            .field("params", &self.params)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .field("attachments", &self.attachments.len())
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .field("file", &self.file)
            .finish()
    }
}
