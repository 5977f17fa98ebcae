//! Access-mode controller
//!
//! [`FlashController`] owns the bus and all driver state: the active device
//! configuration, the cached manual bus mode and the driver settings.
//!
//! The controller is in Auto mode whenever code may run from flash. Every
//! transition to Manual happens inside an [`InterruptGuard`], and the guard
//! is only dropped after the controller is back in Auto.

use core::ops::{Deref, DerefMut};

use crate::bus::{
    dual_byte_opcode, opcodes, AccessMode, AddressSize, BusMode, ControllerSetup, OqspiBus,
};
use crate::chip::{FlashDeviceConfig, JedecId, GENERIC_SINGLE};
use crate::config::DriverConfig;

/// OQSPI flash controller state
pub struct FlashController<B: OqspiBus> {
    pub(crate) bus: B,
    pub(crate) settings: DriverConfig,
    pub(crate) active: FlashDeviceConfig,
    pub(crate) manual_bus_mode: BusMode,
    pub(crate) jedec: Option<JedecId>,
}

impl<B: OqspiBus> FlashController<B> {
    /// Create a controller running the generic single-line configuration
    pub fn new(bus: B, settings: DriverConfig) -> Self {
        Self {
            bus,
            settings,
            active: GENERIC_SINGLE,
            manual_bus_mode: BusMode::Single,
            jedec: None,
        }
    }

    /// Get a reference to the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the controller and return the bus
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Active device configuration
    pub fn active_config(&self) -> &FlashDeviceConfig {
        &self.active
    }

    /// Driver settings
    pub fn settings(&self) -> &DriverConfig {
        &self.settings
    }

    /// JEDEC ID of the identified device, if any
    pub fn jedec_id(&self) -> Option<JedecId> {
        self.jedec
    }

    /// Last manual bus mode programmed into the controller
    pub fn manual_bus_mode(&self) -> BusMode {
        self.manual_bus_mode
    }

    /// Mask interrupts until the returned guard is dropped
    pub fn mask_interrupts(&mut self) -> InterruptGuard<'_, B> {
        let was_enabled = self.bus.disable_interrupts();
        InterruptGuard {
            ctrl: self,
            was_enabled,
        }
    }

    /// Switch to Manual access mode
    ///
    /// Leaving Auto mode while the device sits in continuous read mode
    /// requires clocking the exit sequence first, otherwise the next opcode
    /// would be taken as an address.
    pub fn enter_manual(&mut self) {
        if self.bus.access_mode() != AccessMode::Auto {
            return;
        }
        self.bus.set_access_mode(AccessMode::Manual);

        if self.active.read.continuous_mode {
            self.bus.cs_enable();
            self.bus.write32(opcodes::EXIT_CONTINUOUS_WORD);
            if self.active.address_size == AddressSize::FourByte {
                self.bus.write8(opcodes::EXIT_CONTINUOUS_BYTE);
            }
            self.bus.cs_disable();
        }
    }

    /// Switch back to Auto access mode
    pub fn enter_auto(&mut self) {
        self.bus.set_io(self.active.read.data_bus_mode);
        self.bus.set_access_mode(AccessMode::Auto);
    }

    /// Select the manual bus mode, skipping the reprogramming if unchanged
    pub fn set_bus_mode(&mut self, mode: BusMode, forced: bool) {
        if mode != self.manual_bus_mode || forced {
            self.bus.set_manual_bus_mode(mode);
            self.bus.set_io(mode);
            self.manual_bus_mode = mode;
        }
    }

    /// Shift out `opcode` in the current manual bus mode
    ///
    /// Octal parts configured for two-byte opcodes get the opcode followed
    /// by its complement.
    pub(crate) fn write_opcode(&mut self, opcode: u8) {
        if self.active.opcode_len.use_dual_byte(self.manual_bus_mode) {
            self.bus.write16(dual_byte_opcode(opcode));
        } else {
            self.bus.write8(opcode);
        }
    }

    /// Send a command with no address or data
    pub(crate) fn send_command(&mut self, opcode: u8) {
        self.bus.cs_enable();
        self.write_opcode(opcode);
        self.bus.cs_disable();
    }

    /// Send the address in the current manual bus mode
    pub(crate) fn write_address(&mut self, addr: u32) {
        match self.active.address_size {
            AddressSize::FourByte => self.bus.write32(addr),
            AddressSize::ThreeByte => {
                let mut buf = [0u8; 4];
                for &byte in self.active.address_size.encode(addr, &mut buf) {
                    self.bus.write8(byte);
                }
            }
        }
    }

    /// Program the controller for the generic single-line configuration
    pub(crate) fn preliminary_init(&mut self) {
        self.active = GENERIC_SINGLE;
        self.bus.init(&ControllerSetup::PRELIMINARY);
        self.set_bus_mode(BusMode::Single, true);
    }

    /// Program the controller from the active configuration
    pub(crate) fn controller_init(&mut self) {
        let sys_clk = self.bus.system_clock();
        let cfg = self.active;
        let dummy_bytes = cfg.protocol.dummy_bytes(sys_clk);

        self.bus.init(&ControllerSetup {
            address_size: cfg.address_size,
            clock_mode: cfg.clock_mode,
            clock_divider: sys_clk.controller_divider(),
            opcode_len: cfg.opcode_len,
            read_pipe_delay: crate::bus::read_pipe_delay(sys_clk),
            read: cfg.read,
            dummy_bytes,
        });
        self.bus.set_read_status_instruction(&cfg.read_status);
        self.bus.set_write_enable_instruction(&cfg.write_enable);
        if self.settings.erase_in_auto_mode {
            self.bus
                .set_erase_instruction(&cfg.erase, &cfg.exit_continuous);
        }
        self.bus.set_suspend_resume_instruction(&cfg.suspend_resume);

        log::debug!(
            "Controller programmed for {} ({} dummy bytes at {:?})",
            cfg.name,
            dummy_bytes,
            sys_clk
        );
    }
}

/// RAII guard for a masked-interrupt section
///
/// Dereferences to the controller; interrupts are restored to their
/// previous state when the guard goes out of scope, on every exit path.
pub struct InterruptGuard<'a, B: OqspiBus> {
    ctrl: &'a mut FlashController<B>,
    was_enabled: bool,
}

impl<B: OqspiBus> Deref for InterruptGuard<'_, B> {
    type Target = FlashController<B>;

    fn deref(&self) -> &Self::Target {
        self.ctrl
    }
}

impl<B: OqspiBus> DerefMut for InterruptGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctrl
    }
}

impl<B: OqspiBus> Drop for InterruptGuard<'_, B> {
    fn drop(&mut self) {
        self.ctrl.bus.restore_interrupts(self.was_enabled);
    }
}
