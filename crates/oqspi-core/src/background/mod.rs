//! Background erase and write operations
//!
//! Requesters queue work on an [`OperationQueue`]; the idle context drains
//! it through a [`BackgroundScheduler`], suspending the device whenever an
//! interrupt is pending so code can keep executing from flash.

mod operation;
mod queue;
mod scheduler;

#[cfg(feature = "std")]
mod blocking;

pub use operation::{OperationKind, OperationStatus, PendingFlashOperation, Requester};
pub use queue::OperationQueue;
pub use scheduler::BackgroundScheduler;

#[cfg(feature = "std")]
pub use blocking::{BlockingQueue, CompletionSender};
