//! Queued flash operation

use alloc::vec::Vec;

use crate::config::{MAPPED_WINDOW_SIZE, SECTOR_SIZE};
use crate::error::{Error, Result};

/// Receives the outcome of a background operation
pub trait Requester {
    /// Called once the operation has left the queue, with the byte count
    /// or the reason it was refused
    fn complete(self, result: Result<u32>);
}

/// Kind of background operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Sector erase
    Erase,
    /// Program from an owned buffer, possibly across pages
    Write,
}

/// Device-side state of the active operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationStatus {
    /// Running, or not started yet
    #[default]
    Resumed,
    /// Suspended on the device to let an interrupt run
    Suspended,
}

/// One erase or write waiting for idle time
#[derive(Debug)]
pub struct PendingFlashOperation<R> {
    pub(crate) requester: R,
    pub(crate) addr: u32,
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) size: u32,
    pub(crate) written: u32,
    pub(crate) erase_done: bool,
    pub(crate) kind: OperationKind,
    pub(crate) status: OperationStatus,
}

impl<R> PendingFlashOperation<R> {
    /// Erase of the sector containing `addr`
    pub fn erase(requester: R, addr: u32) -> Self {
        Self {
            requester,
            addr,
            data: None,
            size: SECTOR_SIZE,
            written: 0,
            erase_done: false,
            kind: OperationKind::Erase,
            status: OperationStatus::Resumed,
        }
    }

    /// Write of `data` at `addr`
    ///
    /// Returns `InvalidLength` for an empty buffer and `AddressOutOfBounds`
    /// if the buffer would run past the end of the address space.
    pub fn write(requester: R, addr: u32, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidLength);
        }
        let size = u32::try_from(data.len()).map_err(|_| Error::InvalidLength)?;
        if addr.checked_add(size).is_none() {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(Self {
            requester,
            addr,
            data: Some(data),
            size,
            written: 0,
            erase_done: false,
            kind: OperationKind::Write,
            status: OperationStatus::Resumed,
        })
    }

    /// Kind of operation
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Device-side status
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Target address
    pub fn addr(&self) -> u32 {
        self.addr
    }

    /// Bytes to erase or write
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Bytes written so far; always 0 for an erase
    pub fn written(&self) -> u32 {
        self.written
    }

    /// Whether the device has nothing left to do for this operation
    pub fn is_finished(&self) -> bool {
        match self.kind {
            OperationKind::Erase => self.erase_done,
            OperationKind::Write => self.written == self.size,
        }
    }

    /// Whether the operation lies inside a device of `device_size` bytes
    ///
    /// An erase only needs its address on the device; a write must end on
    /// it too.
    pub fn fits(&self, device_size: u32) -> bool {
        let limit = device_size.min(MAPPED_WINDOW_SIZE);
        match self.kind {
            OperationKind::Erase => self.addr < limit,
            OperationKind::Write => self
                .addr
                .checked_add(self.size)
                .is_some_and(|end| end <= limit),
        }
    }

    /// Byte count reported to the requester
    pub(crate) fn completed_bytes(&self) -> u32 {
        match self.kind {
            OperationKind::Erase => self.size,
            OperationKind::Write => self.written,
        }
    }

    /// Unwritten part of the source buffer
    pub(crate) fn remaining(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data[self.written as usize..],
            None => &[],
        }
    }
}
