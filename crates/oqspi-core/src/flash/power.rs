//! Flash power transitions around controller sleep

use crate::bus::{opcodes, AccessMode, BusMode, OqspiBus};
use crate::config::PowerMode;
use crate::error::Result;

use super::controller::FlashController;

impl<B: OqspiBus> FlashController<B> {
    /// Bring the flash back after [`power_down`](Self::power_down)
    ///
    /// With [`PowerMode::PowerOff`] the device lost its volatile state, so
    /// it is initialized again as after a cold boot.
    pub fn power_up(&mut self) -> Result<()> {
        let mut guard = self.mask_interrupts();
        guard.bus.clock_enable();
        let read_mode = guard.active.read.opcode_bus_mode;
        guard.set_bus_mode(read_mode, true);

        let mut result = Ok(());
        match guard.settings.power_mode {
            PowerMode::AlwaysOn => {}
            PowerMode::PowerDown => {
                guard.enter_manual();
                guard.send_command(opcodes::RDP);
                let delay = guard.active.delays.release_power_down_us;
                guard.bus.delay_us(delay);
            }
            PowerMode::PowerOff => {
                let delay = guard.active.delays.power_up_us;
                guard.bus.delay_us(delay);
                // Fresh device: no continuous mode to exit
                guard.bus.set_access_mode(AccessMode::Manual);
                result = guard.init_callback(BusMode::Single);
            }
        }

        guard.enter_auto();
        log::trace!("Flash powered up");
        result
    }

    /// Prepare the flash for controller sleep
    ///
    /// Must be the last flash access before sleep: the controller is left
    /// in Manual mode with its clock gated until [`power_up`](Self::power_up).
    pub fn power_down(&mut self) {
        let mut guard = self.mask_interrupts();
        let read_mode = guard.active.read.opcode_bus_mode;

        match guard.settings.power_mode {
            PowerMode::AlwaysOn => {}
            PowerMode::PowerDown => {
                guard.enter_manual();
                guard.command_in(opcodes::DP, read_mode);
                let delay = guard.active.delays.power_down_us;
                guard.bus.delay_us(delay);
            }
            PowerMode::PowerOff => {
                guard.enter_manual();
                if read_mode != BusMode::Single {
                    let protocol = guard.active.protocol;
                    protocol.exit_qpi(&mut guard.bus);
                }
            }
        }

        guard.bus.clock_disable();
        log::trace!("Flash powered down ({:?})", guard.settings.power_mode);
    }
}
