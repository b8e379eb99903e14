//! Architecture and sub-architecture tags (§3.5).
//!
//! These are portable integers, not language-level enums with payloads —
//! the wire format stores them as a single byte (AE) or a `u32` bitmask
//! (PEF `cpu`), so `Arch` round-trips through `u8`/`u32` rather than
//! deriving a `scroll` context of its own.

/// A target architecture tag, as stored in [`crate::container::ae::AeHeader::arch`]
/// and bitwise-OR'd into [`crate::container::pef::PefContainer::cpu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Arch {
    Intel86S = 100,
    Amd64 = 101,
    RiscV = 102,
    /// 64x0, the toolchain's own 64-bit RISC-style architecture.
    Arch64000 = 103,
    /// 32x0, the toolchain's own 32-bit RISC-style architecture.
    Arch32000 = 104,
    PowerPc = 105,
    Arm64 = 106,
    Invalid = 0xFF,
}

impl Arch {
    pub const fn from_u8(byte: u8) -> Arch {
        match byte {
            100 => Arch::Intel86S,
            101 => Arch::Amd64,
            102 => Arch::RiscV,
            103 => Arch::Arch64000,
            104 => Arch::Arch32000,
            105 => Arch::PowerPc,
            106 => Arch::Arm64,
            _ => Arch::Invalid,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Bit position of this architecture within `PefContainer::cpu`'s
    /// bitmask. A FAT image's `cpu` is the bitwise-OR of every
    /// contributing object's bit; `Invalid` has none.
    pub const fn cpu_bit(self) -> u32 {
        match self {
            Arch::Intel86S => 0,
            Arch::Amd64 => 1,
            Arch::RiscV => 2,
            Arch::Arch64000 => 3,
            Arch::Arch32000 => 4,
            Arch::PowerPc => 5,
            Arch::Arm64 => 6,
            Arch::Invalid => 31,
        }
    }
}

/// Sub-CPU family, enumerating vendor variants of a given [`Arch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubArch {
    Amd = 200,
    Intel = 201,
    Arm = 202,
    Generic = 203,
    Ibm = 204,
}

impl SubArch {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Base virtual/file origin a PEF image's code is laid out from.
pub const PEF_BASE_ORIGIN: u64 = 0x4000_0000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u8() {
        for arch in [
            Arch::Intel86S,
            Arch::Amd64,
            Arch::RiscV,
            Arch::Arch64000,
            Arch::Arch32000,
            Arch::PowerPc,
            Arch::Arm64,
        ] {
            assert_eq!(Arch::from_u8(arch.as_u8()), arch);
        }
    }

    #[test]
    fn unknown_byte_is_invalid() {
        assert_eq!(Arch::from_u8(7), Arch::Invalid);
    }
}
