//! Register map of the transform core's Wishbone window.

/// Base address used when none is configured.
pub const DEFAULT_BASE_ADDRESS: u32 = 0x0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Register {
    /// Start strobe; the core starts on a 0 -> 1 write.
    Control = 0x00,
    /// Commits the staged input words into the slot in `WriteAddr`.
    LoadStrobe = 0x04,
    WriteAddr = 0x08,
    WriteDataLo = 0x0C,
    WriteDataHi = 0x10,
    /// Output slot select on write, output-valid flag on read.
    ReadAddr = 0x14,
    ReadDataLo = 0x20,
    ReadDataHi = 0x24,
}

impl Register {
    pub const ALL: [Register; 8] = [
        Register::Control,
        Register::LoadStrobe,
        Register::WriteAddr,
        Register::WriteDataLo,
        Register::WriteDataHi,
        Register::ReadAddr,
        Register::ReadDataLo,
        Register::ReadDataHi,
    ];

    pub const fn offset(self) -> u32 {
        self as u32
    }

    pub const fn address(self, base: u32) -> u32 {
        base.wrapping_add(self.offset())
    }

    pub fn from_offset(offset: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.offset() == offset)
    }

    /// Edge-triggered registers never read back the value written to them.
    pub const fn is_self_clearing(self) -> bool {
        matches!(self, Register::Control | Register::LoadStrobe)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::Control => "CONTROL",
            Register::LoadStrobe => "LOAD_STROBE",
            Register::WriteAddr => "WRITE_ADDR",
            Register::WriteDataLo => "WRITE_DATA_LO",
            Register::WriteDataHi => "WRITE_DATA_HI",
            Register::ReadAddr => "READ_ADDR",
            Register::ReadDataLo => "READ_DATA_LO",
            Register::ReadDataHi => "READ_DATA_HI",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_match_the_core() {
        let expected = [0x00, 0x04, 0x08, 0x0C, 0x10, 0x14, 0x20, 0x24];
        for (reg, offset) in Register::ALL.into_iter().zip(expected) {
            assert_eq!(reg.offset(), offset, "{reg}");
            assert_eq!(Register::from_offset(offset), Some(reg));
        }
        assert_eq!(Register::from_offset(0x18), None);
    }

    #[test]
    fn address_is_relative_to_base() {
        assert_eq!(Register::ReadDataHi.address(0x9000_0000), 0x9000_0024);
        assert_eq!(Register::Control.address(0x9000_0000), 0x9000_0000);
    }

    #[test]
    fn only_strobes_self_clear() {
        let clearing: Vec<_> = Register::ALL
            .into_iter()
            .filter(|r| r.is_self_clearing())
            .collect();
        assert_eq!(clearing, [Register::Control, Register::LoadStrobe]);
    }
}
