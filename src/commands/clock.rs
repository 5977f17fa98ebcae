//! Clock command implementation

use crate::error::Result;
use crate::target::Target;
use oqspi_core::bus::{OqspiBus, SysClock};

/// Switch the emulated system clock and retune the driver for it
pub fn run_clock(flash: &mut Target, clock: SysClock) -> Result<()> {
    flash.controller_mut().bus_mut().set_system_clock(clock);
    flash.sys_clock_cfg(clock)?;

    // Fetch from the window so the emulator checks the new read setup
    let mut fetch = [0u8; 16];
    flash.read(0, &mut fetch)?;

    let bus = flash.controller().bus();
    println!("System clock:    {:?}", clock);
    println!("Clock divider:   {:?}", bus.clock_divider());
    println!("Read pipe delay: {}", bus.read_pipe_delay());
    println!("Dummy bytes:     {}", bus.dummy_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oqspi_core::bus::ClockDivider;
    use oqspi_core::chip::DeviceDatabase;
    use oqspi_core::config::DriverConfig;
    use oqspi_core::flash::OqspiFlash;
    use oqspi_dummy::{DummyConfig, DummyOqspi};

    #[test]
    fn test_pll_halves_the_bus_clock() {
        let mx = DeviceDatabase::builtin().find_by_name("MX25U6432").unwrap();
        let bus = DummyOqspi::new(DummyConfig::new(mx));
        let mut flash = OqspiFlash::new(bus, DriverConfig::default());
        assert!(flash.init().unwrap());

        run_clock(&mut flash, SysClock::Pll160).unwrap();
        let bus = flash.controller().bus();
        assert_eq!(bus.clock_divider(), ClockDivider::Div2);
        assert_eq!(bus.dummy_bytes(), 2);
        assert!(bus.violations().is_empty());

        run_clock(&mut flash, SysClock::Xtal32M).unwrap();
        let bus = flash.controller().bus();
        assert_eq!(bus.clock_divider(), ClockDivider::Div1);
        assert_eq!(bus.dummy_bytes(), 1);
        assert!(bus.violations().is_empty());
    }
}
