//! OQSPI bus types and the transport trait

mod address;
mod bus_mode;
pub mod instruction;
pub mod opcodes;
mod traits;

pub use address::AddressSize;
pub use bus_mode::{
    dual_byte_opcode, read_pipe_delay, AccessMode, BusMode, ClockDivider, ClockMode, OpcodeLen,
    SysClock, READ_PIPE_DELAY_0V9, READ_PIPE_DELAY_1V2,
};
pub use instruction::{
    BusyLevel, EraseInstruction, ExitContinuousInstruction, PageProgramInstruction,
    ReadInstruction, ReadStatusInstruction, SuspendResumeInstruction, WriteEnableInstruction,
};
pub use traits::{BusFeatures, ControllerSetup, OqspiBus};
