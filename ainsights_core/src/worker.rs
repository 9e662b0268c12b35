/*!
 * The single background worker thread that drains the job queue.
 *
 * ```text
 *  ┌─────────────┐    unbounded channel    ┌────────────────┐
 *  │  Caller      │ ──────── Job ─────────► │  Worker thread  │
 *  │  (any thread)│                         │  (single)       │
 *  └─────────────┘                         └───────┬────────┘
 *                                                  │
 *                                      RetryTransport::execute()
 *                                                  │
 *                                          resolve Pending
 * ```
 *
 * The loop is a three-state machine:
 *
 * - RUNNING — dequeue with a short poll timeout, execute, resolve.
 * - DRAINING — entered the first time the shutdown flag is observed set;
 *   the observation timestamp starts the grace window. Jobs keep being
 *   dequeued and executed normally, including ones submitted after
 *   draining began.
 * - STOPPED — entered when an empty poll coincides with the flag, when
 *   the grace window elapses, or when a job execution panics (fail-fast,
 *   no restart). The closed signal fires as the thread's last action,
 *   on every path.
 *
 * The poll timeout exists purely so the loop can re-check the shutdown
 * flag without an external wakeup.
 */

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::pending::PendingSlot;
use crate::sync::{AtomicFlag, Signal};
use crate::transport::retry::RetryTransport;
use crate::transport::{Executor, Request};

/// How long a single dequeue blocks before re-checking the shutdown flag.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/**
 * One deferred call: the request to execute plus the slot its outcome
 * lands in. Consumed exactly once by the worker.
 */
pub(crate) struct Job {
    pub(crate) request: Request,
    pub(crate) slot: Arc<PendingSlot>,
}

impl Job {
    /**
     * Executes the call through the retry transport and resolves the
     * slot with whatever came back, success or captured error alike.
     *
     * Transport-level failures are values here; only a panic escapes,
     * and that kills the loop.
     */
    fn run<E: Executor>(self, transport: &RetryTransport<E>) {
        let result = transport.execute(&self.request);
        self.slot.resolve(result);
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

pub(crate) struct Worker;

impl Worker {
    /**
     * Spawns the worker thread. The receiver, transport, and shutdown
     * primitives move into the thread; the client keeps the join handle
     * for `close()`.
     */
    pub(crate) fn spawn<E: Executor + Send + 'static>(
        receiver: Receiver<Job>,
        transport: RetryTransport<E>,
        closing: Arc<AtomicFlag>,
        closed: Arc<Signal>,
        grace: Duration,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("ainsights-worker".into())
            .spawn(move || {
                /*
                 * A panic escaping a job is fatal to the loop but must not
                 * skip the closed signal: closers block on it.
                 */
                let result = catch_unwind(AssertUnwindSafe(|| {
                    Self::run_loop(&receiver, &transport, &closing, grace);
                }));

                if result.is_err() {
                    eprintln!(
                        "[AInsights] Worker thread panicked; queued calls will not be dispatched"
                    );
                }

                closed.notify();
            })
    }

    fn run_loop<E: Executor>(
        receiver: &Receiver<Job>,
        transport: &RetryTransport<E>,
        closing: &AtomicFlag,
        grace: Duration,
    ) {
        /*
         * None while RUNNING; Some(first observation of the shutdown
         * flag) while DRAINING.
         */
        let mut closing_ts: Option<Instant> = None;

        loop {
            if closing_ts.is_none() && closing.is_set() {
                closing_ts = Some(Instant::now());
            }

            if let Some(ts) = closing_ts {
                if ts.elapsed() >= grace {
                    break;
                }
            }

            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(job) => job.run(transport),
                Err(RecvTimeoutError::Timeout) => {
                    /* Empty poll with the flag set: the queue is drained. */
                    if closing.is_set() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    /* Client dropped without close(); nothing more can arrive. */
                    break;
                }
            }
        }
    }
}
