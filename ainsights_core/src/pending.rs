/*!
 * The pending-result handle: a single-assignment slot shared between the
 * submitting caller and the worker thread.
 *
 * Same condvar shape as `sync::Signal`, but carrying a value. The slot
 * is resolved exactly once, with either the final response or the
 * captured transport error; both land in the same place and the caller
 * discriminates by matching the `Result`.
 */

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::transport::{DispatchResult, TransportError};

// ---------------------------------------------------------------------------
// PendingSlot — the shared write side
// ---------------------------------------------------------------------------

/**
 * The worker-facing side of the handle. Held inside the queued `Job`;
 * the worker calls `resolve` exactly once after executing the call.
 */
pub(crate) struct PendingSlot {
    value: Mutex<Option<DispatchResult>>,
    condvar: Condvar,
}

impl PendingSlot {
    /**
     * Stores the outcome and wakes every waiter. A second call is a
     * no-op; the first resolution wins.
     */
    pub(crate) fn resolve(&self, result: DispatchResult) {
        if let Ok(mut slot) = self.value.lock() {
            if slot.is_none() {
                *slot = Some(result);
                self.condvar.notify_all();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pending — the caller-facing handle
// ---------------------------------------------------------------------------

/**
 * Handle returned by every submit operation. Waiting is optional: for
 * fire-and-forget dispatch, just drop it.
 *
 * If the worker dies fatally before reaching this job, the slot is
 * never resolved; callers that must not block forever should prefer
 * `wait_timeout`.
 */
pub struct Pending {
    slot: Arc<PendingSlot>,
}

impl Pending {
    /**
     * Blocks until the job resolves and returns a clone of the outcome.
     */
    pub fn wait(&self) -> DispatchResult {
        match self.slot.value.lock() {
            Ok(guard) => {
                let result = self.condvar().wait_while(guard, |slot| slot.is_none());
                match result {
                    Ok(slot) => slot.clone().unwrap_or(Err(TransportError::Closed)),
                    Err(_) => Err(TransportError::Closed),
                }
            }
            Err(_) => Err(TransportError::Closed),
        }
    }

    /**
     * Blocks up to `timeout`; returns `None` if the job has not resolved
     * in time.
     */
    pub fn wait_timeout(&self, timeout: Duration) -> Option<DispatchResult> {
        let guard = self.slot.value.lock().ok()?;
        let (slot, _) = self
            .condvar()
            .wait_timeout_while(guard, timeout, |slot| slot.is_none())
            .ok()?;
        slot.clone()
    }

    /**
     * Non-blocking check for whether the job has resolved.
     */
    pub fn is_resolved(&self) -> bool {
        self.slot
            .value
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn condvar(&self) -> &Condvar {
        &self.slot.condvar
    }
}

/**
 * Creates a connected handle/slot pair: the handle goes back to the
 * submitter, the slot rides along inside the queued job.
 */
pub(crate) fn pending_pair() -> (Pending, Arc<PendingSlot>) {
    let slot = Arc::new(PendingSlot {
        value: Mutex::new(None),
        condvar: Condvar::new(),
    });

    (Pending { slot: slot.clone() }, slot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
