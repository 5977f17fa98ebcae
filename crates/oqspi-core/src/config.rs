//! Driver configuration

use crate::chip::{FlashDeviceConfig, DEVICE_TABLE};

/// Page size of every supported part
pub const PAGE_SIZE: u32 = 256;

/// Sector erase granularity
pub const SECTOR_SIZE: u32 = 4096;

/// Base of the memory-mapped flash window
pub const MAPPED_BASE: u32 = 0x3800_0000;

/// Size of the memory-mapped flash window
pub const MAPPED_WINDOW_SIZE: u32 = 0x0800_0000;

/// Default largest chunk programmed per write_page call
pub const DEFAULT_MAX_WRITE_SIZE: u32 = 128;

/// Default settle time after the autodetect reset sequence
pub const DEFAULT_AUTODETECT_RESET_DELAY_US: u32 = 12000;

/// How the driver decides which device is attached
#[derive(Debug, Clone, Copy)]
pub enum DetectionPolicy {
    /// Scan a device table; no match is fatal
    Autodetect(&'static [FlashDeviceConfig]),
    /// Expect exactly this device; any other ID is fatal
    ConfigVerify(&'static FlashDeviceConfig),
    /// Assume this device if anything answers; otherwise stay on the
    /// generic single-line configuration
    Default(&'static FlashDeviceConfig),
}

impl DetectionPolicy {
    /// Whether an unidentified device must abort initialization
    pub const fn is_strict(&self) -> bool {
        !matches!(self, Self::Default(_))
    }

    /// Whether the reset sequence has to cover every bus mode
    pub const fn is_autodetect(&self) -> bool {
        matches!(self, Self::Autodetect(_))
    }
}

/// What happens to the flash when the controller is powered down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PowerMode {
    /// Flash stays powered and in standby
    #[default]
    AlwaysOn,
    /// Flash enters deep power-down (0xB9) and is released with 0xAB
    PowerDown,
    /// Flash supply is cut and the device is re-initialized on power up
    PowerOff,
}

/// Driver settings
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Device detection policy
    pub policy: DetectionPolicy,
    /// Largest chunk programmed per write_page call, at most [`PAGE_SIZE`]
    pub max_write_size: u32,
    /// Settle time after the autodetect reset sequence
    pub autodetect_reset_delay_us: u32,
    /// Erase sectors with the controller's auto-erase engine when available
    pub erase_in_auto_mode: bool,
    /// Flash power handling
    pub power_mode: PowerMode,
}

impl DriverConfig {
    /// Configuration with the given policy and default settings
    pub const fn new(policy: DetectionPolicy) -> Self {
        Self {
            policy,
            max_write_size: DEFAULT_MAX_WRITE_SIZE,
            autodetect_reset_delay_us: DEFAULT_AUTODETECT_RESET_DELAY_US,
            erase_in_auto_mode: false,
            power_mode: PowerMode::AlwaysOn,
        }
    }

    /// Set the largest chunk programmed per write_page call
    pub const fn with_max_write_size(mut self, size: u32) -> Self {
        self.max_write_size = size;
        self
    }

    /// Use the controller's auto-erase engine
    pub const fn with_erase_in_auto_mode(mut self, enabled: bool) -> Self {
        self.erase_in_auto_mode = enabled;
        self
    }

    /// Set the power mode
    pub const fn with_power_mode(mut self, mode: PowerMode) -> Self {
        self.power_mode = mode;
        self
    }

    /// Chunk size actually used, clamped to one page
    pub const fn effective_max_write_size(&self) -> u32 {
        if self.max_write_size == 0 || self.max_write_size > PAGE_SIZE {
            PAGE_SIZE
        } else {
            self.max_write_size
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new(DetectionPolicy::Autodetect(&DEVICE_TABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::winbond::W25Q64JWIM;

    static W25Q: FlashDeviceConfig = W25Q64JWIM;

    #[test]
    fn test_defaults() {
        let cfg = DriverConfig::default();
        assert_eq!(cfg.max_write_size, 128);
        assert_eq!(cfg.autodetect_reset_delay_us, 12000);
        assert!(!cfg.erase_in_auto_mode);
        assert_eq!(cfg.power_mode, PowerMode::AlwaysOn);
        assert!(cfg.policy.is_autodetect());
    }

    #[test]
    fn test_max_write_size_clamp() {
        let cfg = DriverConfig::default().with_max_write_size(512);
        assert_eq!(cfg.effective_max_write_size(), 256);
        let cfg = DriverConfig::default().with_max_write_size(64);
        assert_eq!(cfg.effective_max_write_size(), 64);
    }

    #[test]
    fn test_policy_strictness() {
        assert!(DetectionPolicy::Autodetect(&DEVICE_TABLE).is_strict());
        assert!(DetectionPolicy::ConfigVerify(&W25Q).is_strict());
        assert!(!DetectionPolicy::Default(&W25Q).is_strict());
    }
}
