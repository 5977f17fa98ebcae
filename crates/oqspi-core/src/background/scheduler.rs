//! Idle-time scheduler for queued flash operations
//!
//! Code keeps executing from flash while an erase or program runs, so the
//! operation has to be suspended whenever an interrupt wants the CPU. The
//! idle context calls [`BackgroundScheduler::idle_cycle`], which:
//!
//! 1. starts or resumes the oldest operation ([`handle`](BackgroundScheduler::handle)),
//! 2. waits until the device is idle or an interrupt is pending,
//! 3. suspends the device and returns the controller to Auto mode
//!    ([`suspend`](BackgroundScheduler::suspend)),
//! 4. wakes the requester of a finished operation
//!    ([`notify`](BackgroundScheduler::notify)).

use crate::bus::{OqspiBus, SysClock};
use crate::error::{Error, Result};
use crate::flash::FlashController;

use super::operation::{OperationKind, OperationStatus, PendingFlashOperation, Requester};
use super::queue::OperationQueue;

/// Drives queued operations from the idle context
///
/// The oldest queued operation is moved into the active slot when the
/// scheduler first handles it, and stays there until it has finished.
/// Only the active operation ever touches the device.
pub struct BackgroundScheduler<'q, R: Requester> {
    queue: &'q OperationQueue<R>,
    active: Option<PendingFlashOperation<R>>,
}

impl<'q, R: Requester> BackgroundScheduler<'q, R> {
    /// Create a scheduler draining `queue`
    pub fn new(queue: &'q OperationQueue<R>) -> Self {
        Self {
            queue,
            active: None,
        }
    }

    /// Returns true while an operation is queued or active
    pub fn is_pending(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    /// The operation currently driving the device, if any
    pub fn active(&self) -> Option<&PendingFlashOperation<R>> {
        self.active.as_ref()
    }

    /// Run one idle slot
    ///
    /// Does nothing if an interrupt is already pending. Returns true if an
    /// operation completed and its requester was notified.
    pub fn idle_cycle<B: OqspiBus>(&mut self, ctrl: &mut FlashController<B>) -> bool {
        if ctrl.bus.irq_pending() || !self.is_pending() {
            return false;
        }

        {
            let mut guard = ctrl.mask_interrupts();
            // Nothing to wait for if every queued op was refused
            if !self.handle(&mut *guard) && self.active.is_some() {
                wait_for_interrupt_or_idle(&mut *guard);
            }
            self.suspend(&mut *guard);
        }
        self.notify()
    }

    /// Start or resume the oldest operation
    ///
    /// Must run with interrupts masked; the controller may be left in
    /// Manual mode. Returns true if the operation completed.
    ///
    /// A queued operation that does not fit the detected device is handed
    /// back to its requester with `AddressOutOfBounds` without touching
    /// the device.
    pub fn handle<B: OqspiBus>(&mut self, ctrl: &mut FlashController<B>) -> bool {
        while self.active.is_none() {
            let Some(op) = self.queue.pop() else {
                break;
            };
            if op.fits(ctrl.active_config().size_bytes()) {
                self.active = Some(op);
            } else {
                log::warn!(
                    "Refusing {:?} of {} bytes at 0x{:08X}: outside the device",
                    op.kind,
                    op.size,
                    op.addr
                );
                op.requester.complete(Err(Error::AddressOutOfBounds));
            }
        }
        let Some(op) = self.active.as_mut() else {
            return false;
        };

        match op.status {
            OperationStatus::Suspended => {
                ctrl.resume();
                op.status = OperationStatus::Resumed;
                log::trace!("Resumed {:?} at 0x{:08X}", op.kind, op.addr);

                if op.kind == OperationKind::Write {
                    let (irq_pending, in_progress) = write_status(ctrl);
                    if !in_progress {
                        if op.written == op.size {
                            return true;
                        }
                        if !irq_pending {
                            return write_pending(ctrl, op);
                        }
                    }
                }
                false
            }
            OperationStatus::Resumed => match op.kind {
                OperationKind::Erase => {
                    ctrl.erase_sector_manual(op.addr);
                    false
                }
                OperationKind::Write => write_pending(ctrl, op),
            },
        }
    }

    /// Suspend the active operation and return to Auto mode
    ///
    /// An erase that is no longer running when the suspend is attempted
    /// has finished.
    pub fn suspend<B: OqspiBus>(&mut self, ctrl: &mut FlashController<B>) {
        let Some(op) = self.active.as_mut() else {
            return;
        };

        let mut guard = ctrl.mask_interrupts();
        guard.suspend();
        if guard.is_suspended() {
            op.status = OperationStatus::Suspended;
            log::trace!("Suspended {:?} at 0x{:08X}", op.kind, op.addr);
        } else if op.kind == OperationKind::Erase {
            op.erase_done = true;
        }
        guard.enter_auto();
    }

    /// Retire the active operation if it has finished
    ///
    /// Returns true if a requester was woken.
    pub fn notify(&mut self) -> bool {
        let finished = matches!(
            &self.active,
            Some(op) if op.status == OperationStatus::Resumed && op.is_finished()
        );
        if !finished {
            return false;
        }

        match self.active.take() {
            Some(op) => {
                let bytes = op.completed_bytes();
                log::debug!(
                    "{:?} at 0x{:08X} complete ({} bytes)",
                    op.kind,
                    op.addr,
                    bytes
                );
                op.requester.complete(Ok(bytes));
                true
            }
            None => false,
        }
    }

    /// Retune the controller for a new clock, resuming a suspended
    /// operation first on parts that need it
    pub fn sys_clock_cfg<B: OqspiBus>(
        &self,
        ctrl: &mut FlashController<B>,
        sys_clk: SysClock,
    ) -> Result<()> {
        ctrl.sys_clock_cfg(sys_clk, self.is_pending())
    }
}

/// Spin until the device is idle or an interrupt is pending
///
/// Returns `(irq_pending, in_progress)`.
fn write_status<B: OqspiBus>(ctrl: &mut FlashController<B>) -> (bool, bool) {
    let mut irq_pending = false;
    loop {
        irq_pending |= ctrl.bus.irq_pending();
        let in_progress = ctrl.is_busy();
        if irq_pending || !in_progress {
            return (irq_pending, in_progress);
        }
    }
}

fn wait_for_interrupt_or_idle<B: OqspiBus>(ctrl: &mut FlashController<B>) {
    let _ = write_status(ctrl);
}

/// Program chunks until the buffer is done or an interrupt is pending
///
/// Returns true if everything was written and the last program finished.
fn write_pending<B: OqspiBus, R>(
    ctrl: &mut FlashController<B>,
    op: &mut PendingFlashOperation<R>,
) -> bool {
    loop {
        let addr = op.addr.wrapping_add(op.written);
        let chunk = ctrl.write_page(addr, op.remaining());
        op.written += chunk as u32;

        let (irq_pending, in_progress) = write_status(ctrl);
        if !in_progress && op.written == op.size {
            return true;
        }
        if irq_pending || op.written >= op.size {
            return false;
        }
    }
}
