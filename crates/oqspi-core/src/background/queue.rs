//! FIFO of pending background operations

use alloc::collections::VecDeque;
use core::cell::RefCell;

use critical_section::Mutex;

use super::operation::PendingFlashOperation;

/// Operations waiting for idle time, in submission order
///
/// Requesters push from any context; the scheduler pops from the idle
/// context. Every access happens inside a critical section, so the queue
/// can live in a `static`.
pub struct OperationQueue<R> {
    inner: Mutex<RefCell<VecDeque<PendingFlashOperation<R>>>>,
}

impl<R> OperationQueue<R> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Append an operation
    pub fn submit(&self, op: PendingFlashOperation<R>) {
        log::trace!(
            "Queue {:?} at 0x{:08X} ({} bytes)",
            op.kind(),
            op.addr(),
            op.size()
        );
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push_back(op));
    }

    /// Take the oldest operation
    pub(crate) fn pop(&self) -> Option<PendingFlashOperation<R>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    /// Returns true if nothing is queued
    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_empty())
    }
}

impl<R> Default for OperationQueue<R> {
    fn default() -> Self {
        Self::new()
    }
}
