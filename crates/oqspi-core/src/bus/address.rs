//! Address size types

/// Address size used by the flash device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressSize {
    /// 3-byte (24-bit) address - supports up to 16 MiB
    #[default]
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressSize {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns the maximum addressable size in bytes
    pub const fn max_size(&self) -> u32 {
        match self {
            Self::ThreeByte => 16 * 1024 * 1024, // 16 MiB
            Self::FourByte => u32::MAX,          // ~4 GiB
        }
    }

    /// Encode an address MSB first, returning the used part of `buf`
    pub fn encode<'a>(&self, address: u32, buf: &'a mut [u8; 4]) -> &'a [u8] {
        *buf = address.to_be_bytes();
        match self {
            Self::ThreeByte => &buf[1..],
            Self::FourByte => &buf[..],
        }
    }
}
