/*!
 * The public dispatch client: queue + worker + retry transport behind a
 * submit/close surface.
 *
 * Lifecycle:
 * 1. `AsyncClient::new(config)` wires the unbounded channel, the retrying
 *    transport, and the worker thread.
 * 2. `get`/`post`/`put`/`delete` enqueue a job and hand back its
 *    `Pending` handle without blocking.
 * 3. `close()` runs the graceful-shutdown protocol; repeat closers just
 *    wait for the first one to finish.
 *
 * There is deliberately no global instance and no process-exit hook: the
 * owning application decides when to construct and when to close.
 */

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::pending::{pending_pair, Pending};
use crate::sync::{AtomicFlag, Signal};
use crate::transport::retry::RetryTransport;
use crate::transport::{Executor, HttpExecutor, Method, Request, RetryPolicy, TransportError};
use crate::worker::{Job, Worker};

/// Per-attempt request timeout when the config does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default grace window: how long a shutdown keeps draining queued jobs
/// before force-closing the transport.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/**
 * Construction parameters for `AsyncClient`.
 *
 * ```ignore
 * let config = ClientConfig::new("https://ingestion.example.com")
 *     .header("Authorization", "Bearer KEY")
 *     .retry_policy(RetryPolicy::default().max_retries(5));
 * let client = AsyncClient::new(config)?;
 * ```
 */
pub struct ClientConfig {
    /// Base URL every submitted path is resolved against.
    pub base_url: String,

    /// Headers attached to every request.
    pub headers: Vec<(String, String)>,

    /// Per-attempt request timeout.
    pub timeout: Duration,

    /// Retry behaviour; defaults per `RetryPolicy::default()`.
    pub retry_policy: RetryPolicy,

    /// Grace window the shutdown protocol grants queued jobs.
    pub shutdown_grace: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

// ---------------------------------------------------------------------------
// ClientError
// ---------------------------------------------------------------------------

/**
 * Construction failures. Everything after construction flows through
 * `Pending` handles as values instead.
 */
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

// ---------------------------------------------------------------------------
// AsyncClient
// ---------------------------------------------------------------------------

/**
 * Asynchronous, order-preserving HTTP dispatch client.
 *
 * One dedicated worker thread per instance executes submitted calls in
 * strict submission order; a job in retry backoff therefore delays every
 * job behind it. The queue is unbounded: prolonged outages grow it
 * rather than exerting backpressure, a deliberate trade.
 */
pub struct AsyncClient {
    /// Sender side of the unbounded job channel.
    sender: Sender<Job>,

    /// One-shot shutdown intent; the first `close()` wins the swap.
    closing: Arc<AtomicFlag>,

    /// Fired by the worker immediately before its thread exits.
    closed: Arc<Signal>,

    /// Force-close token watched by the retry transport.
    cancel: Arc<Signal>,

    /// Taken by the first closer for the unconditional join.
    worker: Mutex<Option<JoinHandle<()>>>,

    /// Grace window granted to queued jobs during shutdown.
    grace: Duration,
}

impl AsyncClient {
    /**
     * Builds a client that dispatches over HTTP with the configured base
     * URL, headers, timeout, and retry policy, and spawns its worker.
     */
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let executor = HttpExecutor::new(config.base_url, config.headers, config.timeout);
        Self::with_executor(executor, config.retry_policy, config.shutdown_grace)
    }

    /**
     * Builds a client over an arbitrary single-attempt executor. This is
     * the seam tests use to script outcomes without sockets.
     */
    pub fn with_executor<E: Executor + Send + 'static>(
        executor: E,
        policy: RetryPolicy,
        shutdown_grace: Duration,
    ) -> Result<Self, ClientError> {
        let (sender, receiver) = crossbeam_channel::unbounded();

        let closing = Arc::new(AtomicFlag::new());
        let closed = Arc::new(Signal::new());
        let cancel = Arc::new(Signal::new());

        let transport = RetryTransport::new(executor, policy, cancel.clone());
        let handle = Worker::spawn(
            receiver,
            transport,
            closing.clone(),
            closed.clone(),
            shutdown_grace,
        )
        .map_err(|e| ClientError::Spawn(e.to_string()))?;

        Ok(Self {
            sender,
            closing,
            closed,
            cancel,
            worker: Mutex::new(Some(handle)),
            grace: shutdown_grace,
        })
    }

    /**
     * Enqueues a job and returns its handle immediately. Never blocks.
     *
     * If the worker has already stopped (fatal error, or shutdown past
     * the point of accepting work), the handle resolves right here with
     * `TransportError::Closed` rather than hanging forever.
     */
    fn submit(&self, request: Request) -> Pending {
        let (pending, slot) = pending_pair();

        if let Err(rejected) = self.sender.send(Job { request, slot }) {
            eprintln!("[AInsights] Worker has shut down; dropping call");
            rejected.0.slot.resolve(Err(TransportError::Closed));
        }

        pending
    }

    pub fn get(&self, path: impl Into<String>) -> Pending {
        self.submit(Request::new(Method::Get, path))
    }

    pub fn delete(&self, path: impl Into<String>) -> Pending {
        self.submit(Request::new(Method::Delete, path))
    }

    pub fn post(&self, path: impl Into<String>, body: impl Into<String>) -> Pending {
        self.submit(Request::with_body(Method::Post, path, body))
    }

    pub fn put(&self, path: impl Into<String>, body: impl Into<String>) -> Pending {
        self.submit(Request::with_body(Method::Put, path, body))
    }

    /**
     * Graceful shutdown.
     *
     * 1. Atomically read-and-set the shutdown flag.
     * 2. Already set: another close is in flight, so just wait on the
     *    closed signal (unbounded; the signal always fires) and return.
     * 3. First closer: wait up to the grace window for the worker to
     *    drain and signal closed.
     * 4. Whether or not that timed out, force-close the transport so a
     *    worker stuck in a long call or backoff unblocks.
     * 5. Join the worker thread unconditionally. This wait is not
     *    bounded by the grace window.
     */
    pub fn close(&self) {
        if self.closing.get_and_set() {
            self.closed.wait();
            return;
        }

        self.closed.wait_timeout(self.grace);

        self.cancel.notify();

        if let Ok(mut handle) = self.worker.lock() {
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{DispatchResult, Jitter, Response};
    use std::sync::Mutex as StdMutex;
    use std::thread;
    use std::time::Instant;

    /**
     * Executor that records the path of every call it serves, optionally
     * sleeping first to simulate slow requests. Paths containing "fail"
     * come back as non-transient errors; everything else returns 200.
     */
    #[derive(Clone)]
    struct RecordingExecutor {
        calls: Arc<StdMutex<Vec<String>>>,
        delay: Duration,
    }

    impl RecordingExecutor {
        fn new() -> Self {
            Self {
                calls: Arc::new(StdMutex::new(Vec::new())),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                calls: Arc::new(StdMutex::new(Vec::new())),
                delay,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Executor for RecordingExecutor {
        fn execute(&self, request: &Request) -> DispatchResult {
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            self.calls.lock().unwrap().push(request.path.clone());

            if request.path.contains("fail") {
                Err(TransportError::Http("scripted failure".into()))
            } else {
                Ok(Response {
                    status: 200,
                    body: String::new(),
                })
            }
        }
    }

    fn no_backoff() -> RetryPolicy {
        RetryPolicy::default().backoff_factor(0.0).jitter(Jitter::None)
    }

    /**
     * N submitted jobs are dispatched in exactly submission order, and
     * every handle resolves.
     */
    #[test]
    fn test_jobs_dispatch_in_submission_order() {
        let executor = RecordingExecutor::new();
        let client = AsyncClient::with_executor(executor.clone(), no_backoff(), SHUTDOWN_GRACE).unwrap();

        let expected: Vec<String> = (0..10).map(|i| format!("/job/{i}")).collect();
        let handles: Vec<Pending> = expected.iter().map(|p| client.get(p.clone())).collect();

        for handle in &handles {
            assert_eq!(handle.wait().unwrap().status, 200);
        }
        assert_eq!(executor.calls(), expected);

        client.close();
    }

    /**
     * A call failure is captured into the handle as a value; the worker
     * keeps servicing later jobs.
     */
    #[test]
    fn test_call_failure_resolves_handle_and_worker_survives() {
        let executor = RecordingExecutor::new();
        let client = AsyncClient::with_executor(executor.clone(), no_backoff(), SHUTDOWN_GRACE).unwrap();

        let failed = client.get("/fail");
        let after = client.get("/after");

        assert!(matches!(failed.wait(), Err(TransportError::Http(_))));
        assert_eq!(after.wait().unwrap().status, 200);

        client.close();
    }

    /**
     * Both jobs queued before close() are dispatched, in order, before
     * close returns.
     */
    #[test]
    fn test_close_drains_queued_jobs() {
        let executor = RecordingExecutor::with_delay(Duration::from_millis(50));
        let client = AsyncClient::with_executor(executor.clone(), no_backoff(), SHUTDOWN_GRACE).unwrap();

        let first = client.put("/one", "{}");
        let second = client.put("/two", "{}");
        client.close();

        assert_eq!(executor.calls(), vec!["/one", "/two"]);
        assert!(first.is_resolved());
        assert!(second.is_resolved());
    }

    /**
     * Closing an idle client does not burn the whole grace window: the
     * first empty poll after the flag is observed ends the loop.
     */
    #[test]
    fn test_close_on_idle_client_returns_promptly() {
        let client = AsyncClient::with_executor(RecordingExecutor::new(), no_backoff(), SHUTDOWN_GRACE).unwrap();

        let started = Instant::now();
        client.close();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    /**
     * Repeated and concurrent closes all return after the one shutdown
     * sequence; none panic, none run a second teardown.
     */
    #[test]
    fn test_close_is_idempotent_under_concurrency() {
        let client = Arc::new(
            AsyncClient::with_executor(RecordingExecutor::new(), no_backoff(), SHUTDOWN_GRACE).unwrap(),
        );

        let _ = client.get("/only");

        let closers: Vec<_> = (0..4)
            .map(|_| {
                let client = client.clone();
                thread::spawn(move || client.close())
            })
            .collect();

        client.close();
        for closer in closers {
            closer.join().unwrap();
        }

        /* And again after everything settled. */
        client.close();
    }

    /**
     * A submit after shutdown has fully completed resolves immediately
     * with Closed instead of leaving the caller hanging.
     */
    #[test]
    fn test_submit_after_close_resolves_closed() {
        let client = AsyncClient::with_executor(RecordingExecutor::new(), no_backoff(), SHUTDOWN_GRACE).unwrap();
        client.close();

        let pending = client.get("/late");
        assert!(matches!(
            pending.wait_timeout(Duration::from_secs(1)),
            Some(Err(TransportError::Closed))
        ));
    }

    struct PanickingExecutor;

    impl Executor for PanickingExecutor {
        fn execute(&self, _request: &Request) -> DispatchResult {
            thread::sleep(Duration::from_millis(50));
            panic!("scripted worker failure");
        }
    }

    /**
     * A panic inside a job stops the worker for good: the closed signal
     * still fires, close() returns, and neither the panicking call nor
     * any call queued behind it ever resolves.
     */
    #[test]
    fn test_job_panic_stops_worker_and_close_returns() {
        let client =
            AsyncClient::with_executor(PanickingExecutor, no_backoff(), SHUTDOWN_GRACE).unwrap();

        let exploded = client.get("/boom");
        let stranded = client.get("/later");

        client.close();

        assert!(exploded.wait_timeout(Duration::from_millis(200)).is_none());
        assert!(stranded.wait_timeout(Duration::from_millis(200)).is_none());
    }

    struct FailingExecutor;

    impl Executor for FailingExecutor {
        fn execute(&self, _request: &Request) -> DispatchResult {
            Err(TransportError::Network("scripted outage".into()))
        }
    }

    /**
     * When the grace window elapses mid-backoff, close() force-closes
     * the transport: the sleeping retry aborts, the handle resolves
     * Closed, and close() does not wait out the backoff schedule.
     */
    #[test]
    fn test_close_force_closes_transport_after_grace() {
        let policy = RetryPolicy::default()
            .backoff_factor(30.0)
            .jitter(Jitter::None);
        let client =
            AsyncClient::with_executor(FailingExecutor, policy, Duration::from_millis(100))
                .unwrap();

        let pending = client.get("/unreachable");
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        client.close();
        assert!(started.elapsed() < Duration::from_secs(5));

        assert!(matches!(
            pending.wait_timeout(Duration::ZERO),
            Some(Err(TransportError::Closed))
        ));
    }
}
