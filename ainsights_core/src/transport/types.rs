/**
 * Wire-facing value types shared by the executor, the retry layer, and
 * the worker.
 *
 * `Request` and `Response` are deliberately plain data: the retry layer
 * and the worker are generic over the `Executor` trait, so tests can
 * script outcomes without sockets, and the body stays an opaque string
 * whose structure is the caller's concern.
 */

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/**
 * The HTTP methods the dispatch client can submit.
 *
 * An enum rather than a string: the retry policy's allowed-methods check
 * becomes a set membership test with no casing concerns.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/**
 * One deferred outbound call: method, path relative to the client's base
 * URL, and an optional pre-serialized body.
 */
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(method: Method, path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body.into()),
        }
    }
}

/**
 * The outcome of a completed HTTP exchange.
 *
 * Note that a `Response` with a failure status is still a normal value:
 * once retries are exhausted, the last response is handed back as-is and
 * the caller inspects the status itself.
 */
#[derive(Clone, Debug)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/**
 * Failure modes of a dispatch attempt.
 *
 * Only `Network` is transient and retried; `Http` covers request
 * construction and protocol failures that a retry cannot fix; `Closed`
 * means the client force-closed the transport during shutdown.
 */
#[derive(Clone, Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("transport closed")]
    Closed,
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

/**
 * What a pending-result handle eventually resolves with: either the last
 * response (success statuses and exhausted retryable statuses alike) or
 * the captured transport error.
 */
pub type DispatchResult = Result<Response, TransportError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
