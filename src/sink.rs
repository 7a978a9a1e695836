//! Response sink: where handlers put the response.
//!
//! Handlers do not return response values; they write status, headers, and
//! body through the [`ResponseSink`] capability registered in every request
//! context. The sink owns the **written flag** — the pipeline reads it
//! after every handler and stops the chain the moment output has begun, so
//! a middleware that answers a request early (auth failure, cache hit)
//! short-circuits everything downstream, including the terminal action.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use parking_lot::Mutex;

/// The write side of a response, as seen by handlers.
///
/// The core only ever *reads* [`written`](ResponseSink::written); writing
/// is entirely the handlers' business. The flag flips on the first
/// explicit status or body write — setting a header alone does not count
/// as having answered the request.
pub trait ResponseSink: Send + Sync {
    /// Sets the response status. Marks the response as written.
    fn set_status(&self, status: StatusCode);

    /// Inserts a header, replacing any previous value for the same name.
    fn insert_header(&self, name: HeaderName, value: HeaderValue);

    /// Appends a chunk to the response body. Marks the response as written.
    fn write(&self, chunk: &[u8]);

    /// The current status (`200 OK` until changed).
    fn status(&self) -> StatusCode;

    /// Whether output has begun. Pure query, no mutation.
    fn written(&self) -> bool;
}

// ── Buffered implementation ───────────────────────────────────────────────────

#[derive(Default)]
struct Parts {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// Buffering [`ResponseSink`] used by the server: accumulates the full
/// response in memory and converts it into a hyper response once the
/// pipeline finishes.
#[derive(Default)]
pub struct ResponseBuffer {
    parts: Mutex<Parts>,
    written: AtomicBool,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the buffered response. Subsequent writes start a fresh one;
    /// the server calls this exactly once, after `run()` returns.
    pub fn take_response(&self) -> http::Response<Full<Bytes>> {
        let parts = std::mem::take(&mut *self.parts.lock());
        let mut response = http::Response::new(Full::new(Bytes::from(parts.body)));
        *response.status_mut() = parts.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = parts.headers;
        response
    }
}

impl ResponseSink for ResponseBuffer {
    fn set_status(&self, status: StatusCode) {
        self.parts.lock().status = Some(status);
        self.written.store(true, Ordering::Release);
    }

    fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.parts.lock().headers.insert(name, value);
    }

    fn write(&self, chunk: &[u8]) {
        self.parts.lock().body.extend_from_slice(chunk);
        self.written.store(true, Ordering::Release);
    }

    fn status(&self) -> StatusCode {
        self.parts.lock().status.unwrap_or(StatusCode::OK)
    }

    fn written(&self) -> bool {
        self.written.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_alone_do_not_mark_written() {
        let sink = ResponseBuffer::new();
        sink.insert_header(http::header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        assert!(!sink.written());

        sink.write(b"body");
        assert!(sink.written());
    }

    #[test]
    fn status_only_responses_count_as_written() {
        let sink = ResponseBuffer::new();
        assert!(!sink.written());

        sink.set_status(StatusCode::NO_CONTENT);
        assert!(sink.written());

        let response = sink.take_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn body_chunks_accumulate() {
        let sink = ResponseBuffer::new();
        sink.write(b"hello ");
        sink.write(b"world");

        let response = sink.take_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
