//! oqspi-dummy - In-memory OQSPI controller and NOR flash emulator
//!
//! [`DummyOqspi`] implements [`OqspiBus`] on top of a model of a serial NOR
//! part: an array initialized to 0xFF, status registers, busy time counted
//! in status polls, program/erase suspend, continuous read mode, deep
//! power-down and QPI. It also plays the interrupt controller, raising
//! interrupts after a configurable number of status polls.
//!
//! Every manual transaction is logged, and anything the driver does that a
//! real controller would punish (a mapped read while the part is busy, a
//! command while the part is in continuous read mode, ...) is recorded as a
//! [`Violation`] instead of corrupting state silently.

mod device;

#[cfg(test)]
mod scenarios;

use oqspi_core::bus::{
    AccessMode, AddressSize, BusFeatures, BusMode, ClockDivider, ControllerSetup,
    EraseInstruction, ExitContinuousInstruction, OqspiBus, ReadStatusInstruction,
    SuspendResumeInstruction, SysClock, WriteEnableInstruction,
};
use oqspi_core::chip::{winbond::W25Q64JWIM, FlashDeviceConfig, JedecId};

/// Configuration for the emulated controller and flash part
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Part whose command set and register layout are emulated
    pub chip: &'static FlashDeviceConfig,
    /// ID returned by RDID
    pub jedec: JedecId,
    /// Flash size in bytes
    pub size: usize,
    /// Controller features
    pub features: BusFeatures,
    /// Status polls a page program stays busy for
    pub program_ticks: u32,
    /// Status polls a sector erase stays busy for
    pub erase_ticks: u32,
    /// Raise an interrupt every this many status polls
    pub irq_every_polls: Option<u32>,
    /// System clock reported to the driver
    pub system_clock: SysClock,
    /// RDID only answers at this clock divider or slower
    pub rdid_min_divider: ClockDivider,
    /// RDID only answers to the alternate (opcode plus three bytes) form
    pub rdid_alternate_only: bool,
    /// Part starts in continuous read mode
    pub start_in_continuous_mode: bool,
    /// Part starts in deep power-down
    pub start_powered_down: bool,
    /// Part starts in QPI mode
    pub start_in_qpi: bool,
}

impl DummyConfig {
    /// Emulate `chip` in its power-on state
    pub fn new(chip: &'static FlashDeviceConfig) -> Self {
        Self {
            chip,
            jedec: chip.jedec.id,
            size: chip.size_bytes() as usize,
            features: BusFeatures::empty(),
            program_ticks: 2,
            erase_ticks: 4,
            irq_every_polls: None,
            system_clock: SysClock::Xtal32M,
            rdid_min_divider: ClockDivider::Div1,
            rdid_alternate_only: false,
            start_in_continuous_mode: false,
            start_powered_down: false,
            start_in_qpi: false,
        }
    }

    /// Emulate an empty socket: the bus floats high
    pub fn absent() -> Self {
        Self::new(&W25Q64JWIM).with_jedec(JedecId::new(0xFF, 0xFF, 0xFF))
    }

    /// Override the ID returned by RDID
    pub fn with_jedec(mut self, jedec: JedecId) -> Self {
        self.jedec = jedec;
        self
    }

    /// Set the controller features
    pub fn with_features(mut self, features: BusFeatures) -> Self {
        self.features = features;
        self
    }

    /// Set the busy time of page programs and sector erases, in status polls
    pub fn with_busy_ticks(mut self, program: u32, erase: u32) -> Self {
        self.program_ticks = program;
        self.erase_ticks = erase;
        self
    }

    /// Raise an interrupt every `polls` status polls
    pub fn with_irq_every(mut self, polls: u32) -> Self {
        self.irq_every_polls = Some(polls.max(1));
        self
    }

    /// Set the system clock
    pub fn with_system_clock(mut self, clock: SysClock) -> Self {
        self.system_clock = clock;
        self
    }

    /// Make RDID fail at bus clocks faster than `divider`
    pub fn with_rdid_min_divider(mut self, divider: ClockDivider) -> Self {
        self.rdid_min_divider = divider;
        self
    }

    /// Make RDID only answer the alternate form
    pub fn with_rdid_alternate_only(mut self) -> Self {
        self.rdid_alternate_only = true;
        self
    }

    /// Start the part in continuous read mode
    pub fn starting_in_continuous_mode(mut self) -> Self {
        self.start_in_continuous_mode = true;
        self
    }

    /// Start the part in deep power-down
    pub fn starting_powered_down(mut self) -> Self {
        self.start_powered_down = true;
        self
    }

    /// Start the part in QPI mode
    pub fn starting_in_qpi(mut self) -> Self {
        self.start_in_qpi = true;
        self
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::new(&W25Q64JWIM)
    }
}

/// One chip-select framed manual transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Bus mode of the first byte
    pub mode: BusMode,
    /// Bytes shifted out by the controller
    pub bytes: Vec<u8>,
    /// Bus mode of each shifted out byte
    pub modes: Vec<BusMode>,
    /// Bytes shifted in
    pub read: Vec<u8>,
}

impl Transaction {
    fn new() -> Self {
        Self {
            mode: BusMode::Single,
            bytes: Vec::new(),
            modes: Vec::new(),
            read: Vec::new(),
        }
    }

    /// First byte of the transaction
    pub fn opcode(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// Whether the transaction starts with an opcode and its complement
    pub fn is_dual_byte(&self) -> bool {
        matches!(self.bytes.as_slice(), [op, inv, ..] if *inv == !*op)
    }
}

/// A page program accepted by the emulated part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramRecord {
    /// Start address
    pub addr: u32,
    /// Number of data bytes
    pub len: usize,
}

/// Driver behaviour a real controller or part would not tolerate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Chip select asserted while the controller was in Auto mode
    ManualTransferInAuto,
    /// Access mode switched with interrupts enabled
    AccessModeChangeWithInterruptsEnabled,
    /// Mapped read while the controller was in Manual mode
    MappedReadInManual,
    /// Mapped read while a program or erase was running
    MappedReadWhileBusy,
    /// Command sent while the part was in continuous read mode
    CommandInContinuousMode(u8),
    /// Quad data or address phase while Quad Enable was clear
    QuadPhaseWithoutQe(u8),
    /// Page program running past the end of its page
    PageWrap {
        /// Start address of the program
        addr: u32,
        /// Number of data bytes
        len: usize,
    },
    /// Bus access with the controller clock gated
    ClockGated,
    /// Mapped read with a dummy count the part is not configured for
    DummyMismatch {
        /// Dummy bytes programmed in the controller
        programmed: u8,
    },
    /// Auto-erase started without an erase instruction programmed
    AutoEraseNotConfigured,
}

/// Running program or erase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BusyKind {
    Register,
    Program,
    Erase { addr: u32 },
    ChipErase,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BusyState {
    pub(crate) kind: BusyKind,
    pub(crate) ticks: u32,
    pub(crate) suspended: bool,
}

/// Emulated OQSPI controller with a NOR flash attached
pub struct DummyOqspi {
    config: DummyConfig,
    pub(crate) data: Vec<u8>,

    // Flash state
    pub(crate) sr1: u8,
    pub(crate) sr2: u8,
    pub(crate) cr: u8,
    pub(crate) wel: bool,
    pub(crate) busy: Option<BusyState>,
    pub(crate) continuous: bool,
    pub(crate) powered_down: bool,
    pub(crate) qpi: bool,
    pub(crate) reset_enabled: bool,

    // Controller state
    access_mode: AccessMode,
    manual_mode: BusMode,
    io_mode: BusMode,
    divider: ClockDivider,
    read_pipe_delay: u8,
    dummy_bytes: u8,
    setup: Option<ControllerSetup>,
    read_status_instr: Option<ReadStatusInstruction>,
    write_enable_instr: Option<WriteEnableInstruction>,
    erase_instr: Option<(EraseInstruction, ExitContinuousInstruction)>,
    suspend_resume_instr: Option<SuspendResumeInstruction>,
    clock_enabled: bool,
    system_clock: SysClock,
    current: Option<Transaction>,

    // Interrupt controller
    irq_enabled: bool,
    irq_pending: bool,
    polls_since_irq: u32,
    irqs_serviced: u32,

    // Observation
    log: Vec<Transaction>,
    pub(crate) programs: Vec<ProgramRecord>,
    pub(crate) erases: Vec<u32>,
    pub(crate) violations: Vec<Violation>,
    pub(crate) suspends: u32,
    total_delay_us: u64,
}

impl DummyOqspi {
    /// Create an emulator with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        let system_clock = config.system_clock;
        Self {
            data,
            sr1: 0,
            sr2: 0,
            cr: 0,
            wel: false,
            busy: None,
            continuous: config.start_in_continuous_mode,
            powered_down: config.start_powered_down,
            qpi: config.start_in_qpi,
            reset_enabled: false,
            access_mode: AccessMode::Auto,
            manual_mode: BusMode::Single,
            io_mode: BusMode::Single,
            divider: ClockDivider::Div1,
            read_pipe_delay: 0,
            dummy_bytes: 0,
            setup: None,
            read_status_instr: None,
            write_enable_instr: None,
            erase_instr: None,
            suspend_resume_instr: None,
            clock_enabled: true,
            system_clock,
            current: None,
            irq_enabled: true,
            irq_pending: false,
            polls_since_irq: 0,
            irqs_serviced: 0,
            log: Vec::new(),
            programs: Vec::new(),
            erases: Vec::new(),
            violations: Vec::new(),
            suspends: 0,
            total_delay_us: 0,
            config,
        }
    }

    /// Create an emulated W25Q64JW in its power-on state
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create an emulator with pre-filled flash contents
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Manual transactions seen so far
    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    /// Forget the logged transactions, programs and erases
    pub fn clear_log(&mut self) {
        self.log.clear();
        self.programs.clear();
        self.erases.clear();
    }

    /// Page programs accepted so far
    pub fn program_log(&self) -> &[ProgramRecord] {
        &self.programs
    }

    /// Sector erases accepted so far, by sector address
    pub fn erase_log(&self) -> &[u32] {
        &self.erases
    }

    /// Violations recorded so far
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Status register 1 as RDSR would return it
    pub fn status1(&self) -> u8 {
        self.read_sr1()
    }

    /// Status register 2 as RDSR2 would return it
    pub fn status2(&self) -> u8 {
        self.read_sr2()
    }

    /// Macronix configuration register
    pub fn config_register(&self) -> u8 {
        self.cr
    }

    /// Whether Quad Enable is set
    pub fn quad_enabled(&self) -> bool {
        self.qe()
    }

    /// Whether a program or erase is running
    pub fn is_busy(&self) -> bool {
        matches!(self.busy, Some(b) if !b.suspended)
    }

    /// Whether a program or erase is suspended
    pub fn is_suspended(&self) -> bool {
        matches!(self.busy, Some(b) if b.suspended)
    }

    /// Number of suspends the part honoured
    pub fn suspend_count(&self) -> u32 {
        self.suspends
    }

    /// Whether the part is in deep power-down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Whether the part is in continuous read mode
    pub fn in_continuous_mode(&self) -> bool {
        self.continuous
    }

    /// Whether the part is in QPI mode
    pub fn in_qpi(&self) -> bool {
        self.qpi
    }

    /// Last controller setup applied by the driver
    pub fn setup(&self) -> Option<&ControllerSetup> {
        self.setup.as_ref()
    }

    /// Dummy bytes of the Auto mode read instruction
    pub fn dummy_bytes(&self) -> u8 {
        self.dummy_bytes
    }

    /// Read pipe delay programmed in the controller
    pub fn read_pipe_delay(&self) -> u8 {
        self.read_pipe_delay
    }

    /// Pin direction last selected with `set_io`
    pub fn io_mode(&self) -> BusMode {
        self.io_mode
    }

    /// Read status instruction programmed in the controller
    pub fn read_status_instruction(&self) -> Option<&ReadStatusInstruction> {
        self.read_status_instr.as_ref()
    }

    /// Auto-erase instruction programmed in the controller
    pub fn erase_instruction(&self) -> Option<&EraseInstruction> {
        self.erase_instr.as_ref().map(|(erase, _)| erase)
    }

    /// Suspend/resume instruction programmed in the controller
    pub fn suspend_resume_instruction(&self) -> Option<&SuspendResumeInstruction> {
        self.suspend_resume_instr.as_ref()
    }

    /// Whether the controller clock is running
    pub fn clock_enabled(&self) -> bool {
        self.clock_enabled
    }

    /// Whether interrupts are enabled
    pub fn interrupts_enabled(&self) -> bool {
        self.irq_enabled
    }

    /// Number of interrupts serviced
    pub fn irqs_serviced(&self) -> u32 {
        self.irqs_serviced
    }

    /// Make an interrupt pending
    pub fn raise_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Change the system clock reported to the driver
    pub fn set_system_clock(&mut self, clock: SysClock) {
        self.system_clock = clock;
    }

    /// Sum of all delays requested by the driver
    pub fn total_delay_us(&self) -> u64 {
        self.total_delay_us
    }

    pub(crate) fn address_size(&self) -> AddressSize {
        self.setup
            .map(|s| s.address_size)
            .unwrap_or(AddressSize::ThreeByte)
    }

    pub(crate) fn divider(&self) -> ClockDivider {
        self.divider
    }

    /// Count a status poll towards the next interrupt
    pub(crate) fn count_poll(&mut self) {
        if let Some(every) = self.config.irq_every_polls {
            self.polls_since_irq += 1;
            if self.polls_since_irq >= every {
                self.polls_since_irq = 0;
                self.irq_pending = true;
            }
        }
    }

    fn check_clock(&mut self) {
        if !self.clock_enabled {
            self.violations.push(Violation::ClockGated);
        }
    }

    fn push_byte(&mut self, value: u8) {
        self.check_clock();
        let mode = self.manual_mode;
        match self.current.as_mut() {
            Some(t) => {
                if t.bytes.is_empty() {
                    t.mode = mode;
                }
                t.bytes.push(value);
                t.modes.push(mode);
            }
            None => log::warn!("dummy: byte 0x{:02X} shifted without chip select", value),
        }
    }
}

impl OqspiBus for DummyOqspi {
    fn features(&self) -> BusFeatures {
        self.config.features
    }

    fn init(&mut self, setup: &ControllerSetup) {
        self.divider = setup.clock_divider;
        self.read_pipe_delay = setup.read_pipe_delay;
        self.dummy_bytes = setup.dummy_bytes;
        self.setup = Some(*setup);
    }

    fn cs_enable(&mut self) {
        if self.access_mode != AccessMode::Manual {
            self.violations.push(Violation::ManualTransferInAuto);
        }
        self.current = Some(Transaction::new());
    }

    fn cs_disable(&mut self) {
        if let Some(t) = self.current.take() {
            self.execute(&t);
            self.log.push(t);
        }
    }

    fn write8(&mut self, value: u8) {
        self.push_byte(value);
    }

    fn write16(&mut self, value: u16) {
        for byte in value.to_be_bytes() {
            self.push_byte(byte);
        }
    }

    fn write32(&mut self, value: u32) {
        for byte in value.to_be_bytes() {
            self.push_byte(byte);
        }
    }

    fn read8(&mut self) -> u8 {
        self.check_clock();
        let value = match self.current.as_ref() {
            Some(t) => self.respond(t),
            None => 0xFF,
        };
        if let Some(t) = self.current.as_mut() {
            t.read.push(value);
        }
        value
    }

    fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    fn set_access_mode(&mut self, mode: AccessMode) {
        if mode != self.access_mode && self.irq_enabled {
            self.violations
                .push(Violation::AccessModeChangeWithInterruptsEnabled);
        }
        self.access_mode = mode;
    }

    fn set_manual_bus_mode(&mut self, mode: BusMode) {
        self.manual_mode = mode;
    }

    fn set_io(&mut self, mode: BusMode) {
        self.io_mode = mode;
    }

    fn clock_divider(&self) -> ClockDivider {
        self.divider
    }

    fn set_clock_divider(&mut self, divider: ClockDivider) {
        self.divider = divider;
    }

    fn set_read_pipe_delay(&mut self, delay: u8) {
        self.read_pipe_delay = delay;
    }

    fn set_dummy_bytes(&mut self, count: u8) {
        self.dummy_bytes = count;
    }

    fn system_clock(&self) -> SysClock {
        self.system_clock
    }

    fn clock_enable(&mut self) {
        self.clock_enabled = true;
    }

    fn clock_disable(&mut self) {
        self.clock_enabled = false;
    }

    fn set_read_status_instruction(&mut self, instr: &ReadStatusInstruction) {
        self.read_status_instr = Some(*instr);
    }

    fn set_write_enable_instruction(&mut self, instr: &WriteEnableInstruction) {
        self.write_enable_instr = Some(*instr);
    }

    fn set_erase_instruction(
        &mut self,
        instr: &EraseInstruction,
        exit_continuous: &ExitContinuousInstruction,
    ) {
        self.erase_instr = Some((*instr, *exit_continuous));
    }

    fn set_suspend_resume_instruction(&mut self, instr: &SuspendResumeInstruction) {
        self.suspend_resume_instr = Some(*instr);
    }

    fn start_auto_erase(&mut self, addr: u32) {
        if self.erase_instr.is_none() || self.write_enable_instr.is_none() {
            self.violations.push(Violation::AutoEraseNotConfigured);
            return;
        }
        // The controller clocks the exit sequence and WREN on its own
        self.continuous = false;
        self.start_erase(addr);
    }

    fn erase_in_progress(&mut self) -> bool {
        self.tick();
        self.is_busy()
    }

    fn read_mapped(&mut self, addr: u32, buf: &mut [u8]) {
        self.mapped_read(addr, buf);
    }

    fn disable_interrupts(&mut self) -> bool {
        let was_enabled = self.irq_enabled;
        self.irq_enabled = false;
        was_enabled
    }

    fn restore_interrupts(&mut self, was_enabled: bool) {
        self.irq_enabled = was_enabled;
        if was_enabled && self.irq_pending {
            self.irq_pending = false;
            self.irqs_serviced += 1;
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn delay_us(&mut self, us: u32) {
        self.total_delay_us += u64::from(us);
        self.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oqspi_core::bus::opcodes;
    use oqspi_core::protocol;

    fn manual() -> DummyOqspi {
        let mut bus = DummyOqspi::new_default();
        bus.disable_interrupts();
        bus.set_access_mode(AccessMode::Manual);
        bus
    }

    #[test]
    fn test_read_jedec_id() {
        let mut bus = manual();
        let id = protocol::read_jedec_id(&mut bus, false);
        assert_eq!(id, JedecId::new(0xEF, 0x80, 0x17));
        let id = protocol::read_jedec_id(&mut bus, true);
        assert_eq!(id, JedecId::new(0xEF, 0x80, 0x17));
        assert!(bus.violations().is_empty());
    }

    #[test]
    fn test_alternate_only_rdid() {
        let mut bus = DummyOqspi::new(DummyConfig::default().with_rdid_alternate_only());
        bus.disable_interrupts();
        bus.set_access_mode(AccessMode::Manual);
        assert!(!protocol::read_jedec_id(&mut bus, false).is_valid());
        assert!(protocol::read_jedec_id(&mut bus, true).is_valid());
    }

    #[test]
    fn test_program_needs_wel_and_only_clears_bits() {
        let mut bus = manual();
        protocol::write_register(&mut bus, opcodes::PP, &[0x00, 0x10, 0x00, 0x0F]);
        assert!(bus.program_log().is_empty());

        protocol::write_enable(&mut bus);
        protocol::write_register(&mut bus, opcodes::PP, &[0x00, 0x10, 0x00, 0x0F, 0xF0]);
        protocol::wait_ready(&mut bus);
        assert_eq!(&bus.data()[0x1000..0x1002], &[0x0F, 0xF0]);
        assert_eq!(
            bus.program_log(),
            &[ProgramRecord {
                addr: 0x1000,
                len: 2
            }]
        );

        protocol::write_enable(&mut bus);
        protocol::write_register(&mut bus, opcodes::PP, &[0x00, 0x10, 0x00, 0xF0]);
        protocol::wait_ready(&mut bus);
        assert_eq!(bus.data()[0x1000], 0x00);
    }

    #[test]
    fn test_erase_completes_after_polls() {
        let mut bus = DummyOqspi::new(DummyConfig::default().with_busy_ticks(1, 3));
        bus.disable_interrupts();
        bus.set_access_mode(AccessMode::Manual);
        bus.data_mut()[0x2010] = 0x00;

        protocol::write_enable(&mut bus);
        protocol::write_register(&mut bus, opcodes::SE_20, &[0x00, 0x20, 0x10]);
        assert!(bus.is_busy());
        assert_eq!(bus.data()[0x2010], 0x00);

        protocol::wait_ready(&mut bus);
        assert!(!bus.is_busy());
        assert_eq!(bus.data()[0x2010], 0xFF);
        assert_eq!(bus.erase_log(), &[0x2000]);
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut bus = manual();
        protocol::write_enable(&mut bus);
        protocol::write_register(&mut bus, opcodes::SE_20, &[0x00, 0x00, 0x00]);
        assert!(bus.is_busy());

        protocol::command(&mut bus, oqspi_core::chip::winbond::SUSPEND);
        assert!(bus.is_suspended());
        assert_eq!(protocol::read_status1(&mut bus) & opcodes::SR1_WIP, 0);
        assert_ne!(protocol::read_status2(&mut bus) & opcodes::SR2_SUS, 0);

        protocol::command(&mut bus, oqspi_core::chip::winbond::RESUME);
        assert!(bus.is_busy());
        assert_eq!(bus.suspend_count(), 1);
    }

    #[test]
    fn test_page_wrap_is_recorded() {
        let mut bus = manual();
        protocol::write_enable(&mut bus);
        protocol::write_register(&mut bus, opcodes::PP, &[0x00, 0x00, 0xFF, 0x11, 0x22]);
        assert_eq!(bus.data()[0xFF], 0x11);
        assert_eq!(bus.data()[0x00], 0x22);
        assert_eq!(
            bus.violations(),
            &[Violation::PageWrap {
                addr: 0xFF,
                len: 2
            }]
        );
    }

    #[test]
    fn test_command_in_continuous_mode_is_ignored() {
        let mut bus = DummyOqspi::new(DummyConfig::default().starting_in_continuous_mode());
        bus.disable_interrupts();
        bus.set_access_mode(AccessMode::Manual);
        assert!(!protocol::read_jedec_id(&mut bus, false).is_valid());
        assert_eq!(
            bus.violations(),
            &[Violation::CommandInContinuousMode(opcodes::RDID)]
        );

        bus.cs_enable();
        bus.write32(opcodes::EXIT_CONTINUOUS_WORD);
        bus.cs_disable();
        assert!(!bus.in_continuous_mode());
        assert!(protocol::read_jedec_id(&mut bus, false).is_valid());
    }

    #[test]
    fn test_deep_power_down() {
        let mut bus = manual();
        protocol::command(&mut bus, opcodes::DP);
        assert!(bus.is_powered_down());
        assert!(!protocol::read_jedec_id(&mut bus, false).is_valid());
        protocol::command(&mut bus, opcodes::RDP);
        assert!(!bus.is_powered_down());
        assert!(protocol::read_jedec_id(&mut bus, false).is_valid());
    }

    #[test]
    fn test_irq_raised_after_polls_and_serviced_on_restore() {
        let mut bus = DummyOqspi::new(DummyConfig::default().with_irq_every(2));
        let was_enabled = bus.disable_interrupts();
        bus.set_access_mode(AccessMode::Manual);
        protocol::read_status1(&mut bus);
        assert!(!bus.irq_pending());
        protocol::read_status1(&mut bus);
        assert!(bus.irq_pending());

        bus.set_access_mode(AccessMode::Auto);
        bus.restore_interrupts(was_enabled);
        assert!(!bus.irq_pending());
        assert_eq!(bus.irqs_serviced(), 1);
        assert!(bus.violations().is_empty());
    }

    #[test]
    fn test_mode_switch_with_interrupts_enabled_is_recorded() {
        let mut bus = DummyOqspi::new_default();
        bus.set_access_mode(AccessMode::Manual);
        assert_eq!(
            bus.violations(),
            &[Violation::AccessModeChangeWithInterruptsEnabled]
        );
    }
}
