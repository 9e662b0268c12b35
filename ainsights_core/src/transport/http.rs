/*!
 * The ureq-based single-attempt executor.
 *
 * Uses `ureq`, a pure-Rust blocking HTTP client with no async runtime.
 * The worker is already a dedicated background thread, so blocking I/O
 * is exactly what we want.
 *
 * Non-2xx statuses are *not* errors here (`http_status_as_error(false)`):
 * the retry layer decides what a status means, and exhausted retryable
 * statuses are handed back to the caller as plain responses.
 */

use std::time::Duration;

use ureq::Agent;

use crate::transport::types::{Method, Request, Response, TransportError};
use crate::transport::Executor;

/// Connect timeout, separate from the per-request total.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/**
 * Performs one HTTP exchange per `execute` call: base URL join, default
 * headers, send, read body.
 *
 * A single instance is created when the client is built and moved into
 * the worker thread; nothing else touches the underlying agent.
 */
pub struct HttpExecutor {
    agent: Agent,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl HttpExecutor {
    /**
     * Builds an executor for `base_url`, attaching `headers` to every
     * request. `timeout` bounds each individual attempt end to end.
     */
    pub fn new(base_url: impl Into<String>, headers: Vec<(String, String)>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.into(),
            headers,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

impl Executor for HttpExecutor {
    fn execute(&self, request: &Request) -> crate::transport::DispatchResult {
        let url = self.url_for(&request.path);

        /*
         * ureq's builder is typestate-split between body-less and
         * body-carrying methods, hence the two arms.
         */
        let result = match request.method {
            Method::Get | Method::Delete => {
                let mut req = match request.method {
                    Method::Get => self.agent.get(&url),
                    _ => self.agent.delete(&url),
                };
                for (name, value) in &self.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            Method::Post | Method::Put => {
                let mut req = match request.method {
                    Method::Post => self.agent.post(&url),
                    _ => self.agent.put(&url),
                };
                for (name, value) in &self.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.send(request.body.as_deref().unwrap_or(""))
            }
        };

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response
                    .into_body()
                    .read_to_string()
                    .unwrap_or_else(|_| "<unreadable body>".into());

                Ok(Response { status, body })
            }
            Err(err) => Err(classify(err)),
        }
    }
}

/**
 * Splits ureq failures into transient network errors (retried) and
 * everything else (not retried).
 */
fn classify(err: ureq::Error) -> TransportError {
    match err {
        e @ (ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound) => TransportError::Network(e.to_string()),
        e => TransportError::Http(e.to_string()),
    }
}

/**
 * Joins a base URL and a relative path with exactly one slash between
 * them, regardless of how either side was written.
 */
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
