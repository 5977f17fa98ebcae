//! Serial NOR flash opcodes used by the OQSPI driver
//!
//! Vendor specific opcodes (status register 2/3, security register,
//! suspend/resume variants) live next to the device protocol that uses them.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - sets WEL before any program/erase/status write
pub const WREN: u8 = 0x06;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Write Status Register 1
pub const WRSR: u8 = 0x01;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Write Status Register 2
pub const WRSR2: u8 = 0x31;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer, memory type, density)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data, 3-byte address, single line
pub const READ: u8 = 0x03;
/// Fast Read Quad I/O (1-4-4)
pub const QIOR: u8 = 0xEB;

// ============================================================================
// Program and erase
// ============================================================================

/// Page Program (1-1-1, or 4-4-4 in QPI mode)
pub const PP: u8 = 0x02;
/// Quad Page Program (1-1-4)
pub const QPP: u8 = 0x32;
/// Quad Page Program with quad address (1-4-4, Adesto)
pub const QPP_4IO: u8 = 0x33;
/// Sector Erase 4KB
pub const SE_20: u8 = 0x20;
/// Chip Erase
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Power management
// ============================================================================

/// Deep Power Down
pub const DP: u8 = 0xB9;
/// Release from Deep Power Down
pub const RDP: u8 = 0xAB;

// ============================================================================
// QPI mode control
// ============================================================================

/// Enter QPI Mode
pub const EQIO: u8 = 0x38;
/// Exit QPI Mode
pub const RSTQIO: u8 = 0xFF;

// ============================================================================
// Software Reset
// ============================================================================

/// Reset Enable
pub const RSTEN: u8 = 0x66;
/// Reset Device
pub const RST: u8 = 0x99;

// ============================================================================
// Continuous read mode exit
// ============================================================================

/// Word shifted through the extra-byte phase to leave continuous read mode
pub const EXIT_CONTINUOUS_WORD: u32 = 0xFFFF_FFFF;
/// Trailing byte needed when the device uses 32-bit addressing
pub const EXIT_CONTINUOUS_BYTE: u8 = 0xFF;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register 1: Write In Progress / Busy
pub const SR1_WIP: u8 = 0x01;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 0x02;

/// Status Register 2: Quad Enable (Winbond/Adesto)
pub const SR2_QE: u8 = 0x02;
/// Status Register 2: Erase/Program Suspend Status (Winbond/Adesto)
pub const SR2_SUS: u8 = 0x80;
