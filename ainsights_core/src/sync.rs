/*!
 * Shutdown coordination primitives shared between the client and the
 * background worker:
 *
 * - `AtomicFlag` — a one-shot boolean whose read-and-set operation reports
 *   the previous value, so the first closer can tell itself apart from
 *   later ones.
 * - `Signal` — a one-shot event built on `Mutex<bool>` + `Condvar`, safe
 *   for any number of concurrent waiters, with both bounded and unbounded
 *   waits.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// AtomicFlag — one-shot boolean with read-and-set
// ---------------------------------------------------------------------------

/**
 * A boolean that transitions `false → true` exactly once.
 *
 * `get_and_set` returns the *previous* value, so exactly one caller ever
 * observes `false`. That caller owns the shutdown sequence; everyone
 * else just waits for it to finish.
 */
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new() -> Self {
        Self {
            value: AtomicBool::new(false),
        }
    }

    /**
     * Sets the flag and returns the value it held before this call.
     */
    pub fn get_and_set(&self) -> bool {
        self.value.swap(true, Ordering::SeqCst)
    }

    /**
     * Returns the current value without modifying it.
     */
    pub fn is_set(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Signal — one-shot event with timed and untimed waits
// ---------------------------------------------------------------------------

/**
 * A one-shot event. Starts unset; `notify` sets it permanently and wakes
 * every waiter, past and future.
 *
 * Used in two places:
 * - the "closed" signal the worker fires as the last thing it does,
 * - the transport cancel token that interrupts backoff sleeps when the
 *   client force-closes the transport.
 */
pub struct Signal {
    /// Guard protecting the "fired" flag.
    mutex: Mutex<bool>,

    /// Condition variable the waiters block on.
    condvar: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /**
     * Fires the signal. Idempotent; wakes every current waiter.
     */
    pub fn notify(&self) {
        if let Ok(mut fired) = self.mutex.lock() {
            *fired = true;
            self.condvar.notify_all();
        }
    }

    /**
     * Returns whether the signal has fired, without waiting.
     */
    pub fn is_set(&self) -> bool {
        self.mutex.lock().map(|fired| *fired).unwrap_or(true)
    }

    /**
     * Blocks until the signal fires. No timeout; callers must know the
     * signal is guaranteed to fire eventually.
     */
    pub fn wait(&self) {
        if let Ok(guard) = self.mutex.lock() {
            /*
             * `wait_while` loops internally, so spurious wakeups are handled.
             * The binding holds the guard until the wait completes; a
             * poisoned lock degrades to returning immediately, same as
             * `wait_timeout`.
             */
            let _guard = self.condvar.wait_while(guard, |fired| !*fired);
        }
    }

    /**
     * Blocks until the signal fires or `timeout` elapses.
     *
     * # Returns
     * `true` if the signal fired in time, `false` on timeout.
     * A poisoned mutex is treated as a timeout, matching how the rest of
     * the shutdown path degrades.
     */
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if let Ok(guard) = self.mutex.lock() {
            let result = self
                .condvar
                .wait_timeout_while(guard, timeout, |fired| !*fired);

            match result {
                Ok((_, timeout_result)) => !timeout_result.timed_out(),
                Err(_) => false,
            }
        } else {
            false
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
