//! The *Advanced Executable* (AE) relocatable object container (§3.3).
//!
//! `AeHeader` then `count` × `AeRecordHeader` then the code blob at
//! `start_code`. Reloctable-by-offset is the default relocation strategy;
//! [`RelocationKind::AtRuntime`] opts a record out of that, leaving it for
//! the loader.

use alloc::string::String;
use alloc::vec::Vec;
use scroll::{Pread, Pwrite, SizeWith};

use crate::error::{Error, Result};

pub const AE_MAGIC: [u8; 2] = *b"AE";
pub const AE_SYMBOL_LEN: usize = 255;
pub const AE_PAD: usize = 8;

// scroll_derive's Pread/Pwrite/SizeWith only accept array lengths written as
// integer literals, so the struct fields below spell out `255`/`8` directly;
// these assertions keep them in sync with the named constants above.
const _: () = assert!(AE_SYMBOL_LEN == 255);
const _: () = assert!(AE_PAD == 8);

/// Relocation strategy bits carried in [`AeRecordHeader::flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationKind {
    /// Relocate by offset when the image is loaded into its base origin.
    ByOffset = 0x23f,
    /// Leave relocation to the operating system loader.
    AtRuntime = 0x34f,
}

/// Header of an AE object file.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pread, Pwrite, SizeWith)]
pub struct AeHeader {
    pub magic: [u8; 2],
    pub arch: u8,
    pub sub_arch: u8,
    pub count: u64,
    pub size: u8,
    pub start_code: u64,
    pub code_size: u64,
    pub pad: [u8; 8],
}

impl AeHeader {
    pub fn new(arch: u8, sub_arch: u8) -> AeHeader {
        AeHeader {
            magic: AE_MAGIC,
            arch,
            sub_arch,
            count: 0,
            size: core::mem::size_of::<AeHeader>() as u8,
            start_code: 0,
            code_size: 0,
            pad: [0; AE_PAD],
        }
    }

    pub fn is_valid_magic(&self) -> bool {
        self.magic == AE_MAGIC
    }

    /// The two invariants a reader checks before trusting the rest of the
    /// file: `fMagic` and `fSize` (§4.3 step 1).
    pub fn verify(&self) -> Result<()> {
        if !self.is_valid_magic() {
            return Err(Error::BadMagic([self.magic[0], self.magic[1], 0, 0, 0]));
        }
        if self.size as usize != core::mem::size_of::<AeHeader>() {
            return Err(Error::Malformed(alloc::format!(
                "AE header size field is {} but sizeof(AeHeader) is {}",
                self.size,
                core::mem::size_of::<AeHeader>()
            )));
        }
        Ok(())
    }
}

/// One section, undefined reference, or runtime-resolved symbol carried by
/// an AE object.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pread, Pwrite, SizeWith)]
pub struct AeRecordHeader {
    pub name: [u8; 255],
    pub kind: u64,
    pub size: u64,
    pub flags: u64,
    pub offset: u64,
    pub pad: [u8; 8],
}

impl Default for AeRecordHeader {
    fn default() -> Self {
        AeRecordHeader {
            name: [0; AE_SYMBOL_LEN],
            kind: 0,
            size: 0,
            flags: 0,
            offset: 0,
            pad: [0; AE_PAD],
        }
    }
}

// SAFETY: `AeRecordHeader` is `#[repr(C)]`, contains only integer types and
// a fixed byte array, and has no padding bytes between the fields the
// compiler could leave uninitialized (every field is explicitly
// zero-initialized by `Default`). This mirrors `plain::Plain`'s use for
// bulk-reading fixed-size relocation records elsewhere in this toolchain.
unsafe impl plain::Plain for AeRecordHeader {}

impl AeRecordHeader {
    pub fn with_name(name: &str, kind: u64) -> AeRecordHeader {
        let mut record = AeRecordHeader {
            kind,
            ..Default::default()
        };
        record.set_name(name);
        record
    }

    pub fn set_name(&mut self, name: &str) {
        let bytes = name.as_bytes();
        let len = bytes.len().min(AE_SYMBOL_LEN);
        self.name = [0; AE_SYMBOL_LEN];
        self.name[..len].copy_from_slice(&bytes[..len]);
    }

    /// The name, stopping at the first NUL pad byte.
    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(AE_SYMBOL_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// In-memory builder for an AE object, used by the assembler.
#[derive(Debug, Default)]
pub struct AeObject {
    pub arch: u8,
    pub sub_arch: u8,
    pub records: Vec<AeRecordHeader>,
    pub blob: Vec<u8>,
}

impl AeObject {
    pub fn new(arch: u8, sub_arch: u8) -> AeObject {
        AeObject {
            arch,
            sub_arch,
            records: Vec::new(),
            blob: Vec::new(),
        }
    }

    pub fn push_record(&mut self, record: AeRecordHeader) {
        self.records.push(record);
    }

    /// Serialize to the exact on-disk layout: header, record array, blob.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let header_size = core::mem::size_of::<AeHeader>();
        let records_size = self.records.len() * core::mem::size_of::<AeRecordHeader>();
        let start_code = (header_size + records_size) as u64;

        let header = AeHeader {
            magic: AE_MAGIC,
            arch: self.arch,
            sub_arch: self.sub_arch,
            count: self.records.len() as u64,
            size: header_size as u8,
            start_code,
            code_size: self.blob.len() as u64,
            pad: [0; AE_PAD],
        };

        out.resize(header_size + records_size + self.blob.len(), 0);
        out.pwrite_with(header, 0, scroll::LE)?;
        let mut offset = header_size;
        for record in &self.records {
            out.pwrite_with(*record, offset, scroll::LE)?;
            offset += core::mem::size_of::<AeRecordHeader>();
        }
        out[offset..offset + self.blob.len()].copy_from_slice(&self.blob);
        Ok(())
    }
}

/// A fully-parsed AE object, as read back by the linker.
#[derive(Debug)]
pub struct AeObjectRef {
    pub header: AeHeader,
    pub records: Vec<AeRecordHeader>,
    pub blob: Vec<u8>,
}

impl AeObjectRef {
    /// Parses `bytes` per §3.3: fixed header, then `count` record headers,
    /// then the code blob starting at `start_code`.
    pub fn parse(bytes: &[u8]) -> Result<AeObjectRef> {
        let header: AeHeader = bytes.pread_with(0, scroll::LE)?;
        header.verify()?;

        let header_size = core::mem::size_of::<AeHeader>();
        let record_size = core::mem::size_of::<AeRecordHeader>();
        let records_bytes_len = header.count as usize * record_size;

        if header_size + records_bytes_len > bytes.len() {
            return Err(Error::Malformed(
                "AE record table runs past end of file".into(),
            ));
        }

        let mut records = vec![AeRecordHeader::default(); header.count as usize];
        plain::copy_from_bytes(&mut records[..], &bytes[header_size..header_size + records_bytes_len])
            .map_err(|_| Error::Malformed("AE record table is truncated".into()))?;

        let start = header.start_code as usize;
        let end = start
            .checked_add(header.code_size as usize)
            .ok_or_else(|| Error::Malformed("AE code blob offset overflows".into()))?;
        if end > bytes.len() {
            return Err(Error::Malformed("AE code blob runs past end of file".into()));
        }

        Ok(AeObjectRef {
            header,
            records,
            blob: bytes[start..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_bit_exact() {
        let header = AeHeader::new(101, 200);
        let mut buf = [0u8; 64];
        let written = buf.pwrite_with(header, 0, scroll::LE).unwrap();
        let back: AeHeader = buf.pread_with(0, scroll::LE).unwrap();
        assert_eq!(header, back);
        assert_eq!(written, core::mem::size_of::<AeHeader>());
    }

    #[test]
    fn record_name_round_trips() {
        let record = AeRecordHeader::with_name(":UndefinedSymbol:foo", 0xC);
        assert_eq!(record.name_str(), ":UndefinedSymbol:foo");
    }

    #[test]
    fn object_round_trips_through_bytes() {
        let mut object = AeObject::new(101, 200);
        object.push_record(AeRecordHeader::with_name("__ImageStart.code64", 0xC));
        object.blob.extend_from_slice(&[0x90, 0x90, 0x90]);

        let mut bytes = Vec::new();
        object.write_to(&mut bytes).unwrap();

        let parsed = AeObjectRef::parse(&bytes).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].name_str(), "__ImageStart.code64");
        assert_eq!(parsed.blob, vec![0x90, 0x90, 0x90]);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut header = AeHeader::new(101, 200);
        header.magic = *b"XX";
        let mut buf = [0u8; 64];
        buf.pwrite_with(header, 0, scroll::LE).unwrap();
        let err = AeHeader::verify(&buf.pread_with(0, scroll::LE).unwrap());
        assert!(matches!(err, Err(Error::BadMagic(_))));
    }
}
