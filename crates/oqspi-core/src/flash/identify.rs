//! Device identification and configuration
//!
//! The flash may be in any state when the controller starts: continuous
//! read mode, deep power-down, QPI/OPI. The reset sequence pushes it back
//! to single-line standby, then the JEDEC ID is read with a couple of
//! fallbacks and matched against the detection policy.

use heapless::Vec;

use crate::bus::{
    dual_byte_opcode, opcodes, AccessMode, AddressSize, BusFeatures, BusMode, ClockDivider,
    OqspiBus, SysClock,
};
use crate::chip::{FlashDeviceConfig, JedecId};
use crate::config::DetectionPolicy;
use crate::error::{Error, Result};

use super::controller::FlashController;

/// One step of a reset plan: a bus mode and whether the opcode is doubled
type ResetStep = (BusMode, bool);

impl<B: OqspiBus> FlashController<B> {
    /// Send `opcode` in `mode`, optionally in its two-byte form
    fn reset_command(&mut self, opcode: u8, mode: BusMode, dual_byte: bool) {
        self.set_bus_mode(mode, false);
        self.bus.cs_enable();
        if dual_byte {
            self.bus.write16(dual_byte_opcode(opcode));
        } else {
            self.bus.write8(opcode);
        }
        self.bus.cs_disable();
    }

    /// Bus modes a device in an unknown state may be listening on
    fn autodetect_plan(&self) -> Vec<ResetStep, 4> {
        let mut plan = Vec::new();
        if self.bus.features().contains(BusFeatures::OCTA_PINS) {
            let _ = plan.push((BusMode::Octa, false));
            let _ = plan.push((BusMode::Octa, true));
        }
        let _ = plan.push((BusMode::Quad, false));
        let _ = plan.push((BusMode::Single, false));
        plan
    }

    /// Clock out the continuous read exit sequence for a 32-bit address,
    /// which also covers 24-bit parts
    fn exit_continuous_any(&mut self) {
        self.bus.cs_enable();
        self.bus.write32(opcodes::EXIT_CONTINUOUS_WORD);
        self.bus.write8(opcodes::EXIT_CONTINUOUS_BYTE);
        self.bus.cs_disable();
    }

    /// Bring the device back to single-line standby
    ///
    /// Under Autodetect every bus mode is tried since the part is unknown;
    /// otherwise only the configured read opcode mode and Single are used.
    pub fn reset_sequence(&mut self) {
        let mut guard = self.mask_interrupts();
        let power_down_us = guard.active.delays.power_down_us;
        let policy = guard.settings.policy;

        if policy.is_autodetect() {
            guard.bus.set_access_mode(AccessMode::Manual);
            let plan = guard.autodetect_plan();

            // The 0xFF exit word reads the same in either opcode form
            for &(mode, _) in plan.iter().filter(|(_, dual)| !dual) {
                guard.set_bus_mode(mode, false);
                guard.exit_continuous_any();
            }

            for &(mode, dual) in plan.iter() {
                guard.reset_command(opcodes::RDP, mode, dual);
                guard.bus.delay_us(power_down_us);
            }

            for &(mode, dual) in plan.iter() {
                guard.reset_command(opcodes::RSTEN, mode, dual);
                guard.reset_command(opcodes::RST, mode, dual);
            }

            let delay = guard.settings.autodetect_reset_delay_us;
            guard.bus.delay_us(delay);
        } else if let DetectionPolicy::ConfigVerify(cfg) | DetectionPolicy::Default(cfg) = policy {
            guard.bus.set_access_mode(AccessMode::Manual);
            let mode = cfg.read.opcode_bus_mode;
            let dual = cfg.opcode_len.use_dual_byte(mode);

            // The part may still be in the continuous read mode it was
            // left in before the controller was reset
            if cfg.read.continuous_mode {
                guard.set_bus_mode(mode, true);
                guard.bus.cs_enable();
                guard.bus.write32(opcodes::EXIT_CONTINUOUS_WORD);
                if cfg.address_size == AddressSize::FourByte {
                    guard.bus.write8(opcodes::EXIT_CONTINUOUS_BYTE);
                }
                guard.bus.cs_disable();
            }

            guard.reset_command(opcodes::RDP, mode, dual);
            guard.bus.delay_us(cfg.delays.power_down_us);
            guard.reset_command(opcodes::RDP, BusMode::Single, false);
            guard.bus.delay_us(cfg.delays.power_down_us);

            guard.reset_command(opcodes::RSTEN, mode, dual);
            guard.reset_command(opcodes::RST, mode, dual);
            guard.reset_command(opcodes::RSTEN, BusMode::Single, false);
            guard.reset_command(opcodes::RST, BusMode::Single, false);

            guard.bus.delay_us(cfg.delays.reset_us);
        }

        guard.enter_auto();
    }

    /// Read the JEDEC ID on a single line
    pub fn read_jedec_id(&mut self, alternate: bool) -> JedecId {
        let mut guard = self.mask_interrupts();
        guard.enter_manual();
        guard.set_bus_mode(BusMode::Single, false);
        let id = crate::protocol::read_jedec_id(&mut guard.bus, alternate);
        guard.enter_auto();
        log::trace!("JEDEC ID ({}): {}", if alternate { "alt" } else { "normal" }, id);
        id
    }

    /// Match an ID against the detection policy
    fn match_policy(&self, id: &JedecId) -> Option<FlashDeviceConfig> {
        match self.settings.policy {
            DetectionPolicy::Autodetect(table) => {
                table.iter().find(|cfg| cfg.jedec.matches(id)).copied()
            }
            DetectionPolicy::ConfigVerify(cfg) => cfg.jedec.matches(id).then_some(*cfg),
            DetectionPolicy::Default(cfg) => id.is_valid().then_some(*cfg),
        }
    }

    /// Reset the device and identify it
    ///
    /// Tries the normal and the alternate RDID forms, first at the current
    /// clock divider and then at the slowest one. On a match the
    /// configuration is copied into the active slot. The clock divider is
    /// always restored.
    pub fn identify(&mut self) -> Option<JedecId> {
        self.reset_sequence();

        let original = self.bus.clock_divider();
        let mut dividers: Vec<ClockDivider, 2> = Vec::new();
        let _ = dividers.push(original);
        if original != ClockDivider::MAX {
            let _ = dividers.push(ClockDivider::MAX);
        }

        let mut found = None;
        'search: for &divider in dividers.iter() {
            self.bus.set_clock_divider(divider);
            for alternate in [false, true] {
                let id = self.read_jedec_id(alternate);
                if let Some(cfg) = self.match_policy(&id) {
                    found = Some((id, cfg));
                    break 'search;
                }
                log::debug!(
                    "No match for JEDEC ID {} ({:?}, alternate: {})",
                    id,
                    divider,
                    alternate
                );
            }
        }
        self.bus.set_clock_divider(original);

        let (id, cfg) = found?;
        log::info!("Found {} {} (JEDEC {})", cfg.vendor, cfg.name, id);
        self.active = cfg;
        self.jedec = Some(id);
        Some(id)
    }

    /// Run the device's initialization with the manual bus in `mode`
    pub(crate) fn init_callback(&mut self, mode: BusMode) -> Result<()> {
        let sys_clk = self.bus.system_clock();
        let protocol = self.active.protocol;

        let mut guard = self.mask_interrupts();
        guard.enter_manual();
        guard.set_bus_mode(mode, true);
        let result = protocol.initialize(&mut guard.bus, mode, sys_clk);
        guard.enter_auto();
        result
    }

    /// Identify and configure the device
    ///
    /// Returns `Ok(true)` when a device was identified and the controller
    /// switched to its configuration. Under the Default policy a missing
    /// device is not an error: `Ok(false)` is returned and the generic
    /// single-line configuration stays active.
    pub fn init(&mut self) -> Result<bool> {
        {
            let mut guard = self.mask_interrupts();
            guard.preliminary_init();
        }
        self.jedec = None;

        if self.identify().is_some() {
            self.init_callback(BusMode::Single)?;
            self.controller_init();
            return Ok(true);
        }

        let policy = self.settings.policy;
        if policy.is_strict() {
            log::error!("Flash device not found");
            return Err(Error::ChipNotFound);
        }
        log::warn!("No flash answered, staying on the generic configuration");
        if let DetectionPolicy::Default(cfg) = policy {
            self.active.size_bits = cfg.size_bits;
        }
        Ok(false)
    }

    /// Retune the controller and the device for a new system clock
    ///
    /// `background_pending` must be true while a background operation is
    /// queued; parts that cannot take register writes during a suspended
    /// operation get it resumed first.
    pub fn sys_clock_cfg(&mut self, sys_clk: SysClock, background_pending: bool) -> Result<()> {
        self.bus
            .set_read_pipe_delay(crate::bus::read_pipe_delay(sys_clk));
        self.bus.set_clock_divider(sys_clk.controller_divider());

        let protocol = self.active.protocol;
        let mut guard = self.mask_interrupts();

        if guard.active.resume_before_writing_regs && background_pending {
            guard.resume();
            guard.enter_auto();
        }

        if protocol.clock_dependent() {
            let dummy_bytes = protocol.dummy_bytes(sys_clk);
            guard.enter_manual();
            guard.set_bus_mode(BusMode::Single, false);
            let result = protocol.write_dummy_config(&mut guard.bus, dummy_bytes);
            guard.enter_auto();
            result?;
            guard.bus.set_dummy_bytes(dummy_bytes);
        }
        Ok(())
    }
}
