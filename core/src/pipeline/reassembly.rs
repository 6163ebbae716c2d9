//! pipeline/reassembly.rs
//! Index -> payload store shared by decode workers (insert) and the stream writer (take).
//!
//! Each index is written once and read once: after `take` the entry is gone and a
//! late insert for that index is rejected as a duplicate.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

use crate::constants::WRITER_WAIT_SLICE;
use crate::pipeline::parallelism::CancelToken;
use crate::types::ConvertError;

#[derive(Debug, Default)]
struct State {
    pending: BTreeMap<u64, Bytes>,
    /// Highest index already handed to the writer.
    drained: u64,
}

#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    state: Mutex<State>,
    ready: Condvar,
    peak_pending: AtomicUsize,
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded payload and wake the writer.
    pub fn insert(&self, index: u64, payload: Bytes) -> Result<(), ConvertError> {
        {
            let mut state = self.state.lock();
            if index <= state.drained || state.pending.contains_key(&index) {
                return Err(ConvertError::DuplicateChunk { index });
            }
            state.pending.insert(index, payload);
            self.peak_pending.fetch_max(state.pending.len(), Ordering::AcqRel);
        }
        self.ready.notify_all();
        Ok(())
    }

    /// Remove `index` if it is present.
    pub fn take(&self, index: u64) -> Option<Bytes> {
        let mut state = self.state.lock();
        Self::take_locked(&mut state, index)
    }

    /// Block until `index` is present, then remove it. Returns `None` once `cancel` fires.
    ///
    /// The lock is released while waiting; the wait is sliced so cancellation is seen
    /// even if no insert ever arrives.
    pub fn wait_take(&self, index: u64, cancel: &CancelToken) -> Option<Bytes> {
        let mut state = self.state.lock();
        loop {
            if let Some(payload) = Self::take_locked(&mut state, index) {
                return Some(payload);
            }
            if cancel.is_cancelled() {
                return None;
            }
            self.ready.wait_for(&mut state, WRITER_WAIT_SLICE);
        }
    }

    /// Wake any waiter so it re-checks cancellation.
    pub fn wake_all(&self) {
        self.ready.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest number of payloads held at once.
    pub fn peak_pending(&self) -> usize {
        self.peak_pending.load(Ordering::Acquire)
    }

    fn take_locked(state: &mut State, index: u64) -> Option<Bytes> {
        let payload = state.pending.remove(&index)?;
        state.drained = state.drained.max(index);
        Some(payload)
    }
}
