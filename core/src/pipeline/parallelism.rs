//! pipeline/parallelism.rs
//! Admission gate (bounded in-flight work) and cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::types::ConvertError;

/// Shared cancellation flag plus the failures that caused it.
///
/// Cloning is cheap; all clones observe the same state. Cancelling disconnects an
/// internal channel so threads blocked in `AdmissionGate::acquire` wake immediately.
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug)]
struct CancelInner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
    failures: Mutex<Vec<ConvertError>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        // Nothing is ever sent; dropping the sender is the signal.
        let (trigger, signal) = bounded::<()>(0);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
                failures: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.trigger.lock().take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Record a worker failure and cancel the run.
    pub fn fail(&self, err: ConvertError) {
        if !err.is_cancelled() {
            self.inner.failures.lock().push(err);
        }
        self.cancel();
    }

    pub fn has_failed(&self) -> bool {
        !self.inner.failures.lock().is_empty()
    }

    /// Drain recorded failures: the first one alone, or an aggregate if several workers failed.
    pub fn take_failure(&self) -> Option<ConvertError> {
        let mut failures = std::mem::take(&mut *self.inner.failures.lock());
        if failures.is_empty() {
            return None;
        }
        let first = failures.remove(0);
        if failures.is_empty() {
            Some(first)
        } else {
            Some(ConvertError::Aggregate { first: Box::new(first), others: failures })
        }
    }

    /// Result of a drained run: recorded failure first, then plain cancellation.
    pub(crate) fn outcome(&self) -> Result<(), ConvertError> {
        match self.take_failure() {
            Some(err) => Err(err),
            None if self.is_cancelled() => Err(ConvertError::Cancelled),
            None => Ok(()),
        }
    }

    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

/// Counting semaphore bounding concurrently admitted tasks.
///
/// One token per slot travels through a bounded channel: `acquire` sends (blocking
/// while the channel is full) and dropping a `Permit` receives.
#[derive(Debug)]
pub struct AdmissionGate {
    slots: Sender<()>,
    released: Receiver<()>,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (slots, released) = bounded(capacity);
        Self {
            slots,
            released,
            capacity,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Block until a slot is free. Fails with `Cancelled` once `cancel` fires.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<Permit<'_>, ConvertError> {
        if cancel.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }

        let admitted = select! {
            send(self.slots, ()) -> res => res.is_ok(),
            recv(cancel.signal()) -> _ => false,
        };
        if !admitted {
            return Err(ConvertError::Cancelled);
        }

        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        let permit = Permit { gate: self };

        // Both arms may have been ready; cancellation wins.
        if cancel.is_cancelled() {
            drop(permit);
            return Err(ConvertError::Cancelled);
        }
        Ok(permit)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of permits held at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

/// One admitted slot; released on drop.
#[derive(Debug)]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        // Decrement before freeing the slot so `in_flight` never exceeds capacity.
        self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
        let _ = self.gate.released.try_recv();
    }
}
