/*!
 * AInsights Core — the dispatch engine.
 *
 * An asynchronous, order-preserving HTTP dispatch client: callers submit
 * deferred calls without blocking, a single background worker executes
 * them in strict submission order, transient failures are retried with
 * exponential backoff and jitter, and shutdown drains the queue within a
 * bounded grace window.
 *
 * End users should depend on the `ainsights` facade crate, which builds
 * the capture API on top of this engine.
 *
 * # Module structure
 *
 * - `transport/` — how calls hit the wire: value types, ureq executor,
 *   retry policy and retrying wrapper
 * - `worker` — the single background thread and its drain state machine
 * - `client` — the public submit/close surface
 * - `pending` — the pending-result handle
 * - `sync` — one-shot flag and signal primitives
 */

mod client;
mod pending;
mod sync;
mod transport;
mod worker;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{AsyncClient, ClientConfig, ClientError, DEFAULT_TIMEOUT, SHUTDOWN_GRACE};
pub use pending::Pending;
pub use sync::{AtomicFlag, Signal};
pub use transport::{
    DispatchResult, Executor, HttpExecutor, Jitter, Method, Request, Response, RetryPolicy,
    RetryTransport, TransportError,
};
