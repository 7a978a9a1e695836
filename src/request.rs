//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use http_body_util::BodyExt;

use crate::error::Error;

/// An incoming request with its body fully collected, registered
/// request-scoped as `Arc<Request>` so any handler can declare it as a
/// parameter.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Collects a hyper request into an owned value handlers can share.
    pub(crate) async fn read(req: hyper::Request<hyper::body::Incoming>) -> Result<Self, Error> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        })
    }

    /// Builds a request from parts. Handy in tests and for driving the
    /// pipeline without a server in front of it.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, uri, headers, body }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, "application/json".parse().unwrap());

        let req = Request::new(
            Method::POST,
            "/users?page=2".parse().unwrap(),
            headers,
            Bytes::from_static(b"{}"),
        );

        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.path(), "/users");
        assert_eq!(req.body(), b"{}");
    }
}
