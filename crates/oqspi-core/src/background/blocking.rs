//! Blocking submission for threaded hosts
//!
//! The requester parks on a channel until the scheduler retires its
//! operation. There is no timeout: the call returns only once the idle
//! context has finished the work.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use crate::error::{Error, Result};

use super::operation::{PendingFlashOperation, Requester};
use super::queue::OperationQueue;

/// Completion channel sender carried by a queued operation
#[derive(Debug)]
pub struct CompletionSender(SyncSender<Result<u32>>);

impl Requester for CompletionSender {
    fn complete(self, result: Result<u32>) {
        // The requester may have given up; nothing to do then
        let _ = self.0.send(result);
    }
}

/// Operation queue whose requesters block on a channel
pub type BlockingQueue = OperationQueue<CompletionSender>;

fn completion_channel() -> (CompletionSender, Receiver<Result<u32>>) {
    let (tx, rx) = sync_channel(1);
    (CompletionSender(tx), rx)
}

impl OperationQueue<CompletionSender> {
    /// Queue a write of `data` at `addr` and wait until it is programmed
    ///
    /// The whole buffer is written, across pages if needed. Returns the
    /// number of bytes written, or `AddressOutOfBounds` if the scheduler
    /// found the range outside the device.
    pub fn write_page_bg(&self, addr: u32, data: &[u8]) -> Result<u32> {
        let (requester, done) = completion_channel();
        let op = PendingFlashOperation::write(requester, addr, data.to_vec())?;
        self.submit(op);
        done.recv().map_err(|_| Error::OperationAborted)?
    }

    /// Queue an erase of the sector containing `addr` and wait for it
    ///
    /// Returns the sector size.
    pub fn erase_sector_bg(&self, addr: u32) -> Result<u32> {
        let (requester, done) = completion_channel();
        self.submit(PendingFlashOperation::erase(requester, addr));
        done.recv().map_err(|_| Error::OperationAborted)?
    }
}
