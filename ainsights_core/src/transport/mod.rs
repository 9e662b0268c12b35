/**
 * Transport layer — everything between a queued `Request` and bytes on
 * the wire:
 * - `types` — `Method`, `Request`, `Response`, `TransportError`
 * - `http` — the ureq-based single-attempt executor
 * - `retry` — retry policy and the retrying wrapper
 */

pub mod http;
pub mod retry;
pub mod types;

pub use http::HttpExecutor;
pub use retry::{Jitter, RetryPolicy, RetryTransport};
pub use types::{DispatchResult, Method, Request, Response, TransportError};

/**
 * A single-attempt request executor.
 *
 * The seam between the retry layer and the actual HTTP stack: the retry
 * transport calls this once per attempt, and tests substitute scripted
 * implementations for the real `HttpExecutor`.
 */
pub trait Executor {
    fn execute(&self, request: &Request) -> DispatchResult;
}
