//! The *Preferred Executable Format* (PEF) image container (§3.4).
//!
//! `PefContainer` then `count` × `PefCommandHeader`, each command header
//! describing a loadable span of the image (code, data, zero-fill, or a
//! synthetic linker record with no backing bytes). FAT images carry the
//! same layout with the magic byte-swapped so a loader can tell a
//! multi-architecture image from a thin one without reading `cpu`.

use alloc::string::String;
use alloc::vec::Vec;
use scroll::{Pread, Pwrite, SizeWith};

use super::arch::PEF_BASE_ORIGIN;
use crate::error::{Error, Result};

pub const PEF_SYMBOL_LEN: usize = 255;

// scroll_derive's Pread/Pwrite/SizeWith only accept array lengths written as
// integer literals, so `PefCommandHeader::name` spells out `255` directly;
// this assertion keeps it in sync with the named constant above.
const _: () = assert!(PEF_SYMBOL_LEN == 255);

/// Thin-image magic: `"Open"` followed by a NUL.
pub const PEF_MAGIC_THIN: [u8; 5] = *b"Open\0";
/// FAT-image magic: the thin magic with its bytes reversed (`"nepO"` with
/// the trailing NUL now leading).
pub const PEF_MAGIC_FAT: [u8; 5] = [0, b'n', b'e', b'p', b'O'];

/// Kind tag shared by [`PefCommandHeader::kind`] and
/// [`crate::container::ae::AeRecordHeader::kind`] — both containers carry
/// the same small vocabulary of section kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PefKind {
    /// A name that doesn't carry any recognized section suffix.
    Invalid = 0x0,
    /// A synthetic linker record, e.g. the ABI identifier or build epoch.
    LinkerId = 0x1,
    /// The `Container:Exec:END` sentinel header.
    Sentinel = 0x2,
    Code = 0xC,
    Data = 0xD,
    Zero = 0xE,
}

impl PefKind {
    pub const fn from_u16(value: u16) -> Option<PefKind> {
        match value {
            0x0 => Some(PefKind::Invalid),
            0x1 => Some(PefKind::LinkerId),
            0x2 => Some(PefKind::Sentinel),
            0xC => Some(PefKind::Code),
            0xD => Some(PefKind::Data),
            0xE => Some(PefKind::Zero),
            _ => None,
        }
    }
}

/// ABI identifier strings stamped into the synthetic `LinkerId` header
/// (§4.4 step "push synthetic headers").
pub mod abi {
    pub const MSFT: &str = "MSFT";
    pub const SYSV: &str = "SYSV";
    pub const NEP: &str = "_NEP";
    pub const UNKNOWN: &str = "_IDK";

    pub const CODE_MSFT: u32 = 1;
    pub const CODE_SYSV: u32 = 2;
    pub const CODE_NEP: u32 = 3;
    pub const CODE_UNKNOWN: u32 = 0xFFFF_FFFF;
}

/// The `PefContainer::abi` numeric code for a target architecture,
/// paired one-to-one with the textual identifier in [`abi`] that the
/// linker also stamps into a synthetic command header.
pub fn abi_code(arch: super::arch::Arch) -> u32 {
    use super::arch::Arch;
    match arch {
        Arch::Amd64 => abi::CODE_MSFT,
        Arch::PowerPc => abi::CODE_SYSV,
        Arch::Arch32000 | Arch::Arch64000 => abi::CODE_NEP,
        _ => abi::CODE_UNKNOWN,
    }
}

/// Header of a PEF image.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct PefContainer {
    pub magic: [u8; 5],
    pub linker: u32,
    pub version: u32,
    pub kind: u32,
    pub abi: u32,
    /// Bitmask of [`crate::container::arch::Arch`] tags present in the
    /// image; a thin image has exactly one bit set.
    pub cpu: u32,
    pub sub_cpu: u32,
    pub start: u64,
    pub hdr_sz: u64,
    pub count: u64,
    pub checksum: u32,
}

impl PefContainer {
    pub fn new_thin(cpu: u32, sub_cpu: u32, abi: u32) -> PefContainer {
        PefContainer {
            magic: PEF_MAGIC_THIN,
            linker: 0,
            version: 1,
            kind: 0,
            abi,
            cpu,
            sub_cpu,
            start: PEF_BASE_ORIGIN,
            hdr_sz: core::mem::size_of::<PefContainer>() as u64,
            count: 0,
            checksum: 0,
        }
    }

    pub fn is_fat(&self) -> bool {
        self.magic == PEF_MAGIC_FAT
    }

    pub fn verify(&self) -> Result<()> {
        if self.magic != PEF_MAGIC_THIN && self.magic != PEF_MAGIC_FAT {
            let mut magic = [0u8; 5];
            magic.copy_from_slice(&self.magic);
            return Err(Error::BadMagic(magic));
        }
        Ok(())
    }
}

/// One loadable span or synthetic record within a PEF image.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pread, Pwrite, SizeWith)]
pub struct PefCommandHeader {
    pub name: [u8; 255],
    pub cpu: u32,
    pub sub_cpu: u32,
    pub flags: u32,
    pub kind: u16,
    pub offset: u64,
    pub offset_size: u64,
    pub virtual_address: u64,
    pub virtual_size: u64,
}

impl Default for PefKind {
    fn default() -> Self {
        PefKind::Invalid
    }
}

impl Default for PefCommandHeader {
    fn default() -> Self {
        PefCommandHeader {
            name: [0; PEF_SYMBOL_LEN],
            cpu: 0,
            sub_cpu: 0,
            flags: 0,
            kind: 0,
            offset: 0,
            offset_size: 0,
            virtual_address: 0,
            virtual_size: 0,
        }
    }
}

unsafe impl plain::Plain for PefCommandHeader {}

impl PefCommandHeader {
    pub fn set_name(&mut self, name: &str) {
        let bytes = name.as_bytes();
        let len = bytes.len().min(PEF_SYMBOL_LEN);
        self.name = [0; PEF_SYMBOL_LEN];
        self.name[..len].copy_from_slice(&bytes[..len]);
    }

    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PEF_SYMBOL_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// The forced entrypoint record: a name containing both
    /// `__ImageStart` and `.code64` (§3.4 invariant: the entrypoint is
    /// always reclassified as code regardless of what section it was
    /// assembled into).
    pub fn is_code_entrypoint(&self) -> bool {
        let name = self.name_str();
        name.contains("__ImageStart") && name.contains(".code64")
    }
}

/// In-memory builder for a PEF image, used by the linker.
#[derive(Debug)]
pub struct PefImage {
    pub container: PefContainer,
    pub commands: Vec<PefCommandHeader>,
    pub blob: Vec<u8>,
}

impl PefImage {
    pub fn new(container: PefContainer) -> PefImage {
        PefImage {
            container,
            commands: Vec::new(),
            blob: Vec::new(),
        }
    }

    pub fn push_command(&mut self, command: PefCommandHeader) {
        self.commands.push(command);
    }

    pub fn entrypoint(&self) -> Option<&PefCommandHeader> {
        self.commands.iter().find(|c| c.is_code_entrypoint())
    }

    /// Serializes container + command table + blob, matching §3.4's
    /// on-disk order.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let header_size = core::mem::size_of::<PefContainer>();
        let commands_size = self.commands.len() * core::mem::size_of::<PefCommandHeader>();

        let mut container = self.container;
        container.count = self.commands.len() as u64;
        container.hdr_sz = header_size as u64;

        out.resize(header_size + commands_size + self.blob.len(), 0);
        out.pwrite_with(container, 0, scroll::LE)?;
        let mut offset = header_size;
        for command in &self.commands {
            out.pwrite_with(*command, offset, scroll::LE)?;
            offset += core::mem::size_of::<PefCommandHeader>();
        }
        out[offset..offset + self.blob.len()].copy_from_slice(&self.blob);
        Ok(())
    }
}
