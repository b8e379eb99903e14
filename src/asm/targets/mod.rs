//! Per-target opcode tables (§3.5, §4.2).
//!
//! Each target is a plain static table keyed by mnemonic, not a trait
//! object — §9 "Inheritance" re-architects the source's virtual encoder
//! base class as a sum type dispatched on [`crate::container::arch::Arch`]
//! rather than dynamic dispatch, since the set of targets is closed and
//! known at compile time.

pub mod aarch64;
pub mod amd64;
pub mod arch32000;
pub mod arch64000;
pub mod power64;

use crate::asm::form::OpcodeEntry;
use crate::container::arch::Arch;
use crate::error::{Error, Result};

/// Looks up `mnemonic` in the opcode table for `arch`.
pub fn lookup(arch: Arch, mnemonic: &str) -> Option<&'static OpcodeEntry> {
    table(arch)
        .iter()
        .find(|entry| entry.mnemonic.eq_ignore_ascii_case(mnemonic))
}

fn table(arch: Arch) -> &'static [OpcodeEntry] {
    match arch {
        Arch::Amd64 => amd64::TABLE,
        Arch::Arch64000 => arch64000::TABLE,
        Arch::Arch32000 => arch32000::TABLE,
        Arch::Arm64 => aarch64::TABLE,
        Arch::PowerPc => power64::TABLE,
        Arch::Intel86S | Arch::RiscV | Arch::Invalid => &[],
    }
}

/// The largest legal `r<N>` register index for `arch`, per the original
/// per-target register files: 30 for 64×0, 16 for 32×0, and the
/// conventional GPR counts for the remaining three targets.
pub fn register_limit(arch: Arch) -> Result<u32> {
    match arch {
        Arch::Arch64000 => Ok(30),
        Arch::Arch32000 => Ok(16),
        Arch::Amd64 => Ok(16),
        Arch::Arm64 => Ok(32),
        Arch::PowerPc => Ok(32),
        Arch::Intel86S | Arch::RiscV | Arch::Invalid => Err(Error::Lexical {
            line: 0,
            message: alloc::format!("{arch:?} has no assembler target"),
        }),
    }
}
