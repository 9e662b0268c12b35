/*!
 * Retry layer: the immutable `RetryPolicy` that decides *whether* and
 * *how long*, and the `RetryTransport` that wraps a single-attempt
 * `Executor` and applies the policy per request.
 */

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::sync::Signal;
use crate::transport::types::{DispatchResult, Method, Request, TransportError};
use crate::transport::Executor;

// ---------------------------------------------------------------------------
// Jitter
// ---------------------------------------------------------------------------

/**
 * Randomization strategy applied to a computed backoff delay, so that a
 * fleet of clients recovering from the same outage does not retry in
 * lockstep.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Jitter {
    /// Return the exponential base delay exactly.
    None,

    /// Half the base delay guaranteed, the other half randomized:
    /// `base/2 + uniform(0, base/2)`.
    Equal,

    /// Fully randomized: `uniform(0, base)`.
    Full,
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/**
 * Immutable description of which outcomes are retryable and how to space
 * the retries. Behaviour is fully determined by configuration; there is
 * no hidden state.
 */
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: f64,
    status_forcelist: HashSet<u16>,
    allowed_methods: HashSet<Method>,
    jitter: Jitter,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.3;

    /// 408 Request timeout, 425 Too early, 429 Too many requests,
    /// 500 Internal server error, 502 Bad gateway, 503 Service
    /// unavailable, 504 Gateway timeout.
    pub const DEFAULT_STATUS_FORCELIST: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

    /// POST is deliberately absent: retrying non-idempotent calls risks
    /// duplicate side effects.
    pub const DEFAULT_ALLOWED_METHODS: [Method; 3] = [Method::Get, Method::Put, Method::Delete];

    pub const DEFAULT_JITTER: Jitter = Jitter::Full;

    /// Consuming setters for non-default configurations.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn status_forcelist(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.status_forcelist = statuses.into_iter().collect();
        self
    }

    pub fn allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn retry_limit(&self) -> u32 {
        self.max_retries
    }

    /**
     * Whether a response should be retried: the method must be in the
     * allowed set AND the status must be in the forcelist.
     */
    pub fn is_retry(&self, status: u16, method: Method) -> bool {
        self.allowed_methods.contains(&method) && self.status_forcelist.contains(&status)
    }

    /**
     * Computes the delay before retry number `retry_count` (1-indexed:
     * the first retry passes 1).
     *
     * The exponential base is `backoff_factor * 2^(retry_count - 1)`;
     * jitter then maps it into `[0, base]` depending on the mode.
     */
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let base = self.backoff_factor * f64::powi(2.0, retry_count as i32 - 1);

        let seconds = match self.jitter {
            Jitter::None => base,
            Jitter::Equal => base / 2.0 + rand::rng().random_range(0.0..=base / 2.0),
            Jitter::Full => rand::rng().random_range(0.0..=base),
        };

        Duration::from_secs_f64(seconds.max(0.0))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            backoff_factor: Self::DEFAULT_BACKOFF_FACTOR,
            status_forcelist: Self::DEFAULT_STATUS_FORCELIST.into_iter().collect(),
            allowed_methods: Self::DEFAULT_ALLOWED_METHODS.into_iter().collect(),
            jitter: Self::DEFAULT_JITTER,
        }
    }
}

// ---------------------------------------------------------------------------
// RetryTransport
// ---------------------------------------------------------------------------

/**
 * Wraps a single-attempt `Executor` and applies the `RetryPolicy` on
 * each outbound request.
 *
 * Stateless beyond the per-request attempt counter. The `cancel` signal
 * is the client's force-close token: it interrupts backoff sleeps and
 * fails any further attempt with `TransportError::Closed`, so a worker
 * stuck in a retry sequence unblocks promptly during shutdown.
 */
pub struct RetryTransport<E: Executor> {
    executor: E,
    policy: RetryPolicy,
    cancel: Arc<Signal>,
}

impl<E: Executor> RetryTransport<E> {
    pub fn new(executor: E, policy: RetryPolicy, cancel: Arc<Signal>) -> Self {
        Self {
            executor,
            policy,
            cancel,
        }
    }

    /**
     * Executes `request`, retrying per policy.
     *
     * - A response the policy deems non-retryable returns immediately.
     * - A retryable response retries while attempts remain; once
     *   exhausted, the *last response* is returned as a success and the
     *   caller inspects the status itself.
     * - A transient error retries while attempts remain; once exhausted,
     *   the error propagates.
     * - A non-transient error propagates immediately, unretried.
     */
    pub fn execute(&self, request: &Request) -> DispatchResult {
        let mut retries = 0;

        loop {
            if self.cancel.is_set() {
                return Err(TransportError::Closed);
            }

            match self.executor.execute(request) {
                Ok(response) => {
                    if !self.policy.is_retry(response.status, request.method) {
                        return Ok(response);
                    }
                    if retries >= self.policy.retry_limit() {
                        return Ok(response);
                    }
                }
                Err(err) => {
                    if !err.is_transient() {
                        return Err(err);
                    }
                    if retries >= self.policy.retry_limit() {
                        return Err(err);
                    }
                }
            }

            retries += 1;

            /*
             * Sleep by waiting on the cancel signal: a force-close during
             * backoff aborts the sequence instead of finishing the nap.
             */
            if self.cancel.wait_timeout(self.policy.backoff_delay(retries)) {
                return Err(TransportError::Closed);
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
    use crate::transport::types::Response;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn response(status: u16) -> Response {
        Response {
            status,
            body: String::new(),
        }
    }

    /**
     * Executor that replays a fixed script of outcomes and counts how
     * many attempts were made. Once the script runs dry it keeps
     * repeating the final outcome.
     */
    struct ScriptedExecutor {
        script: Mutex<VecDeque<DispatchResult>>,
        last: DispatchResult,
        attempts: AtomicUsize,
    }

    impl ScriptedExecutor {
        fn new(script: Vec<DispatchResult>, last: DispatchResult) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last,
                attempts: AtomicUsize::new(0),
            }
        }

        fn repeating(outcome: DispatchResult) -> Self {
            Self::new(Vec::new(), outcome)
        }
    }

    impl Executor for &ScriptedExecutor {
        fn execute(&self, _request: &Request) -> DispatchResult {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.last.clone())
        }
    }

    /// Zero backoff so exhaustion tests finish instantly.
    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .backoff_factor(0.0)
            .jitter(Jitter::None)
    }

    fn transport(executor: &ScriptedExecutor, policy: RetryPolicy) -> RetryTransport<&ScriptedExecutor> {
        RetryTransport::new(executor, policy, Arc::new(Signal::new()))
    }

    // -- RetryPolicy ---------------------------------------------------------

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retry_limit(), 3);
        assert!(policy.is_retry(503, Method::Get));
        assert_eq!(policy.jitter, Jitter::Full);
    }

    #[test]
    fn test_custom_policy() {
        let policy = RetryPolicy::default()
            .max_retries(5)
            .backoff_factor(0.5)
            .status_forcelist([500, 502])
            .allowed_methods([Method::Get])
            .jitter(Jitter::None);

        assert_eq!(policy.retry_limit(), 5);
        assert!(policy.is_retry(500, Method::Get));
        assert!(!policy.is_retry(503, Method::Get));
        assert!(!policy.is_retry(500, Method::Put));
    }

    /**
     * With jitter disabled the delay is the exponential base exactly:
     * factor 0.5 gives 0.5 s, 1.0 s, 2.0 s for retries 1, 2, 3.
     */
    #[test]
    fn test_backoff_without_jitter_is_deterministic() {
        let policy = RetryPolicy::default()
            .backoff_factor(0.5)
            .jitter(Jitter::None);

        assert_eq!(policy.backoff_delay(1), Duration::from_secs_f64(0.5));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs_f64(1.0));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs_f64(2.0));
    }

    /**
     * FULL jitter samples in [0, base]; EQUAL in [base/2, base].
     */
    #[test]
    fn test_backoff_jitter_bounds() {
        let full = RetryPolicy::default().backoff_factor(0.5).jitter(Jitter::Full);
        let equal = RetryPolicy::default().backoff_factor(0.5).jitter(Jitter::Equal);

        for retry in 1..=3u32 {
            let base = 0.5 * f64::powi(2.0, retry as i32 - 1);

            for _ in 0..200 {
                let sampled = full.backoff_delay(retry).as_secs_f64();
                assert!((0.0..=base).contains(&sampled));

                let sampled = equal.backoff_delay(retry).as_secs_f64();
                assert!((base / 2.0..=base).contains(&sampled));
            }
        }
    }

    /**
     * The full retry decision cross product: retryable status AND
     * allowed method are both required.
     */
    #[test]
    fn test_retry_decision() {
        let policy = RetryPolicy::default();

        assert!(policy.is_retry(500, Method::Get));
        assert!(!policy.is_retry(200, Method::Get));
        assert!(!policy.is_retry(500, Method::Post));
        assert!(policy.is_retry(429, Method::Get));
        assert!(policy.is_retry(500, Method::Put));
        assert!(policy.is_retry(500, Method::Delete));
        assert!(!policy.is_retry(404, Method::Get));
        assert!(!policy.is_retry(200, Method::Post));
    }

    // -- RetryTransport ------------------------------------------------------

    #[test]
    fn test_successful_request_single_attempt() {
        let executor = ScriptedExecutor::repeating(Ok(response(200)));
        let result = transport(&executor, fast_policy()).execute(&Request::new(Method::Get, "test"));

        assert_eq!(result.unwrap().status, 200);
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_recovers_from_transient_error() {
        let executor = ScriptedExecutor::new(
            vec![Err(TransportError::Network("timed out".into()))],
            Ok(response(200)),
        );
        let result = transport(&executor, fast_policy()).execute(&Request::new(Method::Get, "test"));

        assert_eq!(result.unwrap().status, 200);
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 2);
    }

    /**
     * Persistent transient failure: exactly max_retries retries, then
     * the error propagates.
     */
    #[test]
    fn test_persistent_transient_error_exhausts_retries() {
        let executor = ScriptedExecutor::repeating(Err(TransportError::Network("refused".into())));
        let result = transport(&executor, fast_policy()).execute(&Request::new(Method::Get, "test"));

        assert!(matches!(result, Err(TransportError::Network(_))));
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 4); // 1 initial + 3 retries
    }

    /**
     * Persistent retryable status: retries are exhausted and the last
     * response is returned as a normal value, not an error.
     */
    #[test]
    fn test_persistent_retryable_status_returns_last_response() {
        let executor = ScriptedExecutor::repeating(Ok(response(503)));
        let result = transport(&executor, fast_policy()).execute(&Request::new(Method::Get, "test"));

        assert_eq!(result.unwrap().status, 503);
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_non_retryable_status_returns_immediately() {
        let executor = ScriptedExecutor::repeating(Ok(response(404)));
        let result = transport(&executor, fast_policy()).execute(&Request::new(Method::Get, "test"));

        assert_eq!(result.unwrap().status, 404);
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 1);
    }

    /**
     * POST is not in the allowed-methods set, so even a forcelisted
     * status is not retried.
     */
    #[test]
    fn test_post_is_never_retried() {
        let executor = ScriptedExecutor::repeating(Ok(response(500)));
        let result =
            transport(&executor, fast_policy()).execute(&Request::new(Method::Post, "test"));

        assert_eq!(result.unwrap().status, 500);
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_transient_error_is_not_retried() {
        let executor = ScriptedExecutor::repeating(Err(TransportError::Http("bad uri".into())));
        let result = transport(&executor, fast_policy()).execute(&Request::new(Method::Get, "test"));

        assert!(matches!(result, Err(TransportError::Http(_))));
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 1);
    }

    /**
     * A fired cancel token fails the request before any attempt runs.
     */
    #[test]
    fn test_cancel_token_aborts_before_attempt() {
        let executor = ScriptedExecutor::repeating(Ok(response(200)));
        let cancel = Arc::new(Signal::new());
        cancel.notify();

        let transport = RetryTransport::new(&executor, fast_policy(), cancel);
        let result = transport.execute(&Request::new(Method::Get, "test"));

        assert!(matches!(result, Err(TransportError::Closed)));
        assert_eq!(executor.attempts.load(Ordering::SeqCst), 0);
    }
}
