//! OQSPI bus and access modes

/// Number of data lines used for one phase of a transaction
///
/// Unlike a classic SPI I/O mode, the OQSPI controller programs each
/// phase (opcode, address, data) separately, so a single instruction may
/// switch between bus modes several times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BusMode {
    /// One data line (IO0 out, IO1 in)
    #[default]
    Single,
    /// Two data lines
    Dual,
    /// Four data lines
    Quad,
    /// Eight data lines (requires IO4-IO7 routed to the controller)
    Octa,
}

impl BusMode {
    /// Returns the number of data lines used in this mode
    pub const fn lines(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Dual => 2,
            Self::Quad => 4,
            Self::Octa => 8,
        }
    }
}

/// Controller access mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Memory-mapped reads (execute in place)
    #[default]
    Auto,
    /// Register-driven command mode
    Manual,
}

/// Length of the opcode phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OpcodeLen {
    /// Plain one-byte opcode
    #[default]
    OneByte,
    /// Opcode followed by its complement (octal DTR/STR parts)
    TwoBytes,
}

impl OpcodeLen {
    /// Whether an opcode sent in `bus_mode` must use the two-byte form
    ///
    /// Two-byte opcodes only exist on the octal bus. The same device
    /// still accepts single-byte opcodes while in single/quad mode.
    pub const fn use_dual_byte(&self, bus_mode: BusMode) -> bool {
        matches!(self, Self::TwoBytes) && matches!(bus_mode, BusMode::Octa)
    }
}

/// Encode `opcode` in its two-byte form: the opcode followed by its complement
pub const fn dual_byte_opcode(opcode: u8) -> u16 {
    ((opcode as u16) << 8) | (!opcode as u16)
}

/// SPI clock polarity used by the controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockMode {
    /// Clock idles low (SPI mode 0)
    #[default]
    Low,
    /// Clock idles high (SPI mode 3)
    High,
}

/// Controller clock divider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClockDivider {
    /// Bus clock = source clock
    #[default]
    Div1,
    /// Bus clock = source clock / 2
    Div2,
    /// Bus clock = source clock / 4
    Div4,
    /// Bus clock = source clock / 8
    Div8,
}

impl ClockDivider {
    /// Slowest divider the controller supports
    pub const MAX: Self = Self::Div8;

    /// Returns the division factor
    pub const fn factor(&self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div8 => 8,
        }
    }

    /// Returns the log2 of the division factor
    pub const fn shift(&self) -> u32 {
        match self {
            Self::Div1 => 0,
            Self::Div2 => 1,
            Self::Div4 => 2,
            Self::Div8 => 3,
        }
    }
}

/// System clock source feeding the controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SysClock {
    /// 32 MHz crystal
    #[default]
    Xtal32M,
    /// 32 MHz internal RC
    Rchs32,
    /// 64 MHz internal RC
    Rchs64,
    /// 96 MHz internal RC
    Rchs96,
    /// 160 MHz PLL
    Pll160,
}

impl SysClock {
    /// Returns the clock frequency in Hz
    pub const fn freq_hz(&self) -> u32 {
        match self {
            Self::Xtal32M | Self::Rchs32 => 32_000_000,
            Self::Rchs64 => 64_000_000,
            Self::Rchs96 => 96_000_000,
            Self::Pll160 => 160_000_000,
        }
    }

    /// Returns true if the clock is faster than the 32 MHz crystal
    pub const fn is_fast(&self) -> bool {
        self.freq_hz() > 32_000_000
    }

    /// Divider the controller must use at this system clock
    ///
    /// The bus cannot run at 160 MHz, so the PLL is halved to 80 MHz.
    pub const fn controller_divider(&self) -> ClockDivider {
        match self {
            Self::Pll160 => ClockDivider::Div2,
            _ => ClockDivider::Div1,
        }
    }
}

/// Read pipe clock delay for a slow (0V9) core supply
pub const READ_PIPE_DELAY_0V9: u8 = 7;
/// Read pipe clock delay for a fast (1V2) core supply
pub const READ_PIPE_DELAY_1V2: u8 = 0;

/// Read pipe delay matching the system clock
pub const fn read_pipe_delay(sys_clk: SysClock) -> u8 {
    if sys_clk.is_fast() {
        READ_PIPE_DELAY_1V2
    } else {
        READ_PIPE_DELAY_0V9
    }
}
