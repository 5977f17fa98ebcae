//! Built-in device table
//!
//! Parts the driver knows how to drive at full speed, plus the generic
//! single-line configuration used before identification.

use super::adesto::{AT25QL641, AT25SL128};
use super::macronix::MX25U6432;
use super::protocol::GenericSpi;
use super::types::{FlashDelays, FlashDeviceConfig, JedecId, JedecMatch};
use super::winbond::W25Q64JWIM;
use crate::bus::{
    opcodes, AddressSize, BusMode, ClockMode, EraseInstruction, ExitContinuousInstruction,
    OpcodeLen, PageProgramInstruction, ReadInstruction, ReadStatusInstruction,
    SuspendResumeInstruction, WriteEnableInstruction,
};

/// Conservative configuration every JEDEC SPI25 part accepts
///
/// Every phase on a single line, plain 0x03 read, 0x02 page program and no
/// continuous mode. The controller runs with it until a device is
/// identified; under the Default policy it stays active if none is.
pub const GENERIC_SINGLE: FlashDeviceConfig = FlashDeviceConfig {
    name: "generic",
    vendor: "unknown",
    jedec: JedecMatch::exact(JedecId::new(0x00, 0x00, 0x00)),
    size_bits: 0,
    address_size: AddressSize::ThreeByte,
    clock_mode: ClockMode::Low,
    opcode_len: OpcodeLen::OneByte,
    read: ReadInstruction::SINGLE,
    erase: EraseInstruction::sector_single(100),
    read_status: ReadStatusInstruction::single(0),
    write_enable: WriteEnableInstruction::SINGLE,
    page_program: PageProgramInstruction {
        opcode: opcodes::PP,
        opcode_bus_mode: BusMode::Single,
        addr_bus_mode: BusMode::Single,
        data_bus_mode: BusMode::Single,
    },
    suspend_resume: SuspendResumeInstruction {
        suspend_opcode: 0x75,
        resume_opcode: 0x7A,
        suspend_bus_mode: BusMode::Single,
        resume_bus_mode: BusMode::Single,
        suspend_latency_us: 30,
        resume_latency_us: 3,
        resume_to_suspend_latency_us: 100,
    },
    exit_continuous: ExitContinuousInstruction::QUAD,
    delays: FlashDelays {
        reset_us: 12000,
        power_down_us: 10,
        release_power_down_us: 30,
        power_up_us: 10000,
    },
    protocol: &GenericSpi,
    resume_before_writing_regs: false,
};

/// Devices scanned by the Autodetect policy, in match priority order
pub static DEVICE_TABLE: [FlashDeviceConfig; 4] = [MX25U6432, W25Q64JWIM, AT25SL128, AT25QL641];

/// Read-only view over a device table
#[derive(Debug, Clone, Copy)]
pub struct DeviceDatabase {
    devices: &'static [FlashDeviceConfig],
}

impl Default for DeviceDatabase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DeviceDatabase {
    /// Database over the built-in table
    pub const fn builtin() -> Self {
        Self {
            devices: &DEVICE_TABLE,
        }
    }

    /// Database over a caller supplied table
    pub const fn new(devices: &'static [FlashDeviceConfig]) -> Self {
        Self { devices }
    }

    /// Get all devices in the database
    pub const fn devices(&self) -> &'static [FlashDeviceConfig] {
        self.devices
    }

    /// Get the number of devices in the database
    pub const fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if the database is empty
    pub const fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find the first device whose JEDEC pattern matches `id`
    pub fn find_by_jedec_id(&self, id: &JedecId) -> Option<&'static FlashDeviceConfig> {
        self.devices.iter().find(|c| c.jedec.matches(id))
    }

    /// Find a device by name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&'static FlashDeviceConfig> {
        self.devices
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Iterate over the devices of one vendor (case-insensitive)
    pub fn find_by_vendor<'a>(
        &self,
        vendor: &'a str,
    ) -> impl Iterator<Item = &'static FlashDeviceConfig> + 'a {
        self.devices
            .iter()
            .filter(move |c| c.vendor.eq_ignore_ascii_case(vendor))
    }

    /// Iterate over all devices
    pub fn iter(&self) -> impl Iterator<Item = &'static FlashDeviceConfig> {
        self.devices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_jedec_id() {
        let db = DeviceDatabase::builtin();
        let chip = db.find_by_jedec_id(&JedecId::new(0xEF, 0x80, 0x17)).unwrap();
        assert_eq!(chip.name, "W25Q64JWIM");
        assert_eq!(chip.size_bytes(), 8 * 1024 * 1024);

        let chip = db.find_by_jedec_id(&JedecId::new(0xC2, 0x25, 0x37)).unwrap();
        assert_eq!(chip.name, "MX25U6432");

        assert!(db.find_by_jedec_id(&JedecId::new(0xFF, 0xFF, 0xFF)).is_none());
    }

    #[test]
    fn test_table_order() {
        let names: [&str; 4] = core::array::from_fn(|i| DEVICE_TABLE[i].name);
        assert_eq!(names, ["MX25U6432", "W25Q64JWIM", "AT25SL128", "AT25QL641"]);
    }

    #[test]
    fn test_lookup_by_name_and_vendor() {
        let db = DeviceDatabase::builtin();
        assert_eq!(db.find_by_name("at25ql641").unwrap().vendor, "Adesto");
        assert_eq!(db.find_by_vendor("ADESTO").count(), 2);
        assert!(db.find_by_name("W25Q128JV").is_none());
    }

    #[test]
    fn test_table_invariants() {
        for chip in DEVICE_TABLE.iter() {
            assert!(chip.jedec.id.is_valid(), "{}", chip.name);
            assert!(chip.size_bytes() <= chip.address_size.max_size(), "{}", chip.name);
            assert!(chip.read.continuous_mode, "{}", chip.name);
        }
        assert!(!GENERIC_SINGLE.read.continuous_mode);
        assert_eq!(GENERIC_SINGLE.page_program.data_bus_mode, BusMode::Single);
    }
}
