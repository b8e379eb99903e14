//! Intake, header ingestion, and symbol resolution (§4.3 steps 1-6, 8).

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::classify::{self, RUNTIME_PREFIX, UNDEFINED_PREFIX};
use crate::container::ae::AeObjectRef;
use crate::container::arch::Arch;
use crate::container::pef::{abi, PefCommandHeader, PefKind};
use crate::error::{Error, Result};

/// What kind of PEF image the linker is producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Exec = 0,
    Dylib = 1,
    Object = 2,
    Debug = 3,
    Driver = 4,
}

/// Accumulated linker state: the merged command table, the concatenated
/// blob, and the resolution worklist. This is the only non-trivial
/// control state in the linker (§2), bundled explicitly rather than kept
/// in statics (§9 "Global state").
#[derive(Debug, Default)]
pub struct LinkContext {
    pub commands: Vec<PefCommandHeader>,
    pub blob: Vec<u8>,
    pub undefined: BTreeSet<String>,
    pub duplicates: Vec<String>,
    pub start_found: bool,
    pub cpu: u32,
}

fn is_kept_record_name(name: &str) -> bool {
    name.contains(".code64")
        || name.contains(".data64")
        || name.contains(".zero64")
        || name.contains(classify::ENTRYPOINT_SYMBOL)
        || name.starts_with(UNDEFINED_PREFIX)
}

impl LinkContext {
    pub fn new() -> LinkContext {
        LinkContext::default()
    }

    /// Step 1: verifies arch compatibility, folds the object's arch bit
    /// into `cpu`, appends its blob to the running buffer, and returns
    /// the byte offset the blob was appended at.
    pub fn intake_object(&mut self, object: &AeObjectRef, target: Arch, fat: bool) -> Result<usize> {
        if object.header.arch != target.as_u8() && !fat {
            return Err(Error::ArchMismatch {
                expected: target.as_u8(),
                found: object.header.arch,
            });
        }
        self.cpu |= 1u32 << Arch::from_u8(object.header.arch).cpu_bit();
        let intake_offset = self.blob.len();
        log::debug!("intaking object arch={:#x} at blob offset {intake_offset}", object.header.arch);
        self.blob.extend_from_slice(&object.blob);
        Ok(intake_offset)
    }

    /// Step 2: copies each kept AE record into a `PefCommandHeader`.
    /// Records whose name carries none of the recognized section
    /// suffixes, the entrypoint symbol, nor the undefined-reference
    /// prefix are dropped.
    pub fn ingest_headers(&mut self, object: &AeObjectRef, intake_offset: usize) {
        for record in &object.records {
            let name = record.name_str();
            if !is_kept_record_name(&name) {
                continue;
            }
            let is_entrypoint = name.contains(classify::ENTRYPOINT_SYMBOL) && name.contains(".code64");
            if is_entrypoint {
                self.start_found = true;
            }
            self.commands.push(PefCommandHeader {
                name: {
                    let mut buf = [0u8; crate::container::pef::PEF_SYMBOL_LEN];
                    let bytes = name.as_bytes();
                    let len = bytes.len().min(buf.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                    buf
                },
                cpu: object.header.arch as u32,
                sub_cpu: object.header.sub_arch as u32,
                flags: record.flags as u32,
                kind: record.kind as u16,
                offset: intake_offset as u64 + record.offset,
                offset_size: record.size,
                virtual_address: 0,
                virtual_size: 0,
            });
        }
    }

    /// Step 3: every command whose name carries `:UndefinedSymbol:` but
    /// not `:RuntimeSymbol:` is added to the resolution worklist.
    pub fn collect_undefined(&mut self) {
        for command in &self.commands {
            let name = command.name_str();
            if name.contains(UNDEFINED_PREFIX) && !name.contains(RUNTIME_PREFIX) {
                self.undefined.insert(name);
            }
        }
    }

    /// Step 4: naive O(N·M) substring resolution. For each undefined
    /// entry, strip the prefix and `$` separators, then look for any
    /// *other* header whose name contains that run of characters. On a
    /// hit, re-walk the matched span byte-by-byte as a sanity check
    /// before declaring it resolved — correctness, not speed, is the
    /// contract here (§4.3 step 4 / §9).
    pub fn resolve_undefined(&mut self) {
        let worklist: Vec<String> = self.undefined.iter().cloned().collect();
        for entry in worklist {
            let demangled = classify::demangle_undefined(&entry);
            if demangled.is_empty() {
                continue;
            }
            let resolved = self.commands.iter().any(|command| {
                let candidate = command.name_str();
                if candidate.starts_with(UNDEFINED_PREFIX) {
                    return false;
                }
                match candidate.find(demangled.as_str()) {
                    Some(pos) => verify_tail(&candidate, pos, &demangled),
                    None => false,
                }
            });
            if resolved {
                log::debug!("resolved {entry} against a matching definition");
                self.undefined.remove(&entry);
            }
        }
    }

    /// Step 5.
    pub fn enforce_entrypoint(&self, kind: ImageKind) -> Result<()> {
        if kind == ImageKind::Exec && !self.start_found {
            return Err(Error::MissingEntrypoint);
        }
        Ok(())
    }

    /// Step 6: appends the five synthetic headers in their fixed order.
    /// The build epoch and GUID are supplied by the caller rather than
    /// generated here — both are explicitly out-of-core-scope services
    /// (a date-string generator and a UUID generator) that this resolver
    /// treats as opaque inputs.
    pub fn push_synthetic_headers(
        &mut self,
        arch: Arch,
        stack_size: u64,
        build_epoch: &str,
        guid: [u8; 16],
    ) {
        self.push_synthetic(&format!("BuildEpoch:{build_epoch}"), PefKind::Zero);
        self.push_synthetic(abi_identifier(arch), PefKind::LinkerId);
        self.push_synthetic(&format!("SizeOfReserveStack:{stack_size}"), PefKind::LinkerId);
        self.push_synthetic(&format!("GUID:4:{}", hex16(guid)), PefKind::LinkerId);
        self.push_synthetic("Container:Exec:END", PefKind::Sentinel);
    }

    fn push_synthetic(&mut self, name: &str, kind: PefKind) {
        let mut header = PefCommandHeader::default();
        header.set_name(name);
        header.kind = kind as u16;
        self.commands.push(header);
    }

    /// Step 8: two headers sharing a name (neither bearing the
    /// `:UndefinedSymbol:` prefix) are a duplicate definition.
    pub fn find_duplicates(&mut self) -> &[String] {
        self.duplicates.clear();
        for i in 0..self.commands.len() {
            let name_i = self.commands[i].name_str();
            if name_i.starts_with(UNDEFINED_PREFIX) {
                continue;
            }
            for command_j in &self.commands[i + 1..] {
                let name_j = command_j.name_str();
                if name_j.starts_with(UNDEFINED_PREFIX) {
                    continue;
                }
                if name_i == name_j && !self.duplicates.contains(&name_i) {
                    self.duplicates.push(name_i.clone());
                }
            }
        }
        &self.duplicates
    }
}

fn verify_tail(candidate: &str, start: usize, needle: &str) -> bool {
    candidate[start..].as_bytes().iter().zip(needle.as_bytes()).all(|(a, b)| a == b)
        && candidate.len() - start >= needle.len()
}

fn abi_identifier(arch: Arch) -> &'static str {
    match arch {
        Arch::Amd64 => abi::MSFT,
        Arch::PowerPc => abi::SYSV,
        Arch::Arch32000 | Arch::Arch64000 => abi::NEP,
        _ => abi::UNKNOWN,
    }
}

fn hex16(bytes: [u8; 16]) -> String {
    let mut out = String::with_capacity(32);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ae::AeRecordHeader;
    use crate::container::arch::SubArch;

    fn make_object(arch: Arch, records: Vec<AeRecordHeader>, blob: Vec<u8>) -> AeObjectRef {
        use crate::container::ae::AeHeader;
        AeObjectRef {
            header: AeHeader::new(arch.as_u8(), SubArch::Generic.as_u8()),
            records,
            blob,
        }
    }

    #[test]
    fn undefined_symbol_resolves_against_matching_definition() {
        let mut ctx = LinkContext::new();
        let defining = make_object(
            Arch::Amd64,
            vec![AeRecordHeader::with_name("bar.code64", PefKind::Code as u64)],
            vec![0x90],
        );
        let referencing = make_object(
            Arch::Amd64,
            vec![AeRecordHeader::with_name(
                &classify::mangle_undefined("bar"),
                0,
            )],
            vec![],
        );
        for object in [&defining, &referencing] {
            let offset = ctx.intake_object(object, Arch::Amd64, false).unwrap();
            ctx.ingest_headers(object, offset);
        }
        ctx.collect_undefined();
        assert_eq!(ctx.undefined.len(), 1);
        ctx.resolve_undefined();
        assert!(ctx.undefined.is_empty());
    }

    #[test]
    fn unresolved_reference_stays_in_worklist() {
        let mut ctx = LinkContext::new();
        let referencing = make_object(
            Arch::Amd64,
            vec![AeRecordHeader::with_name(
                &classify::mangle_undefined("bar"),
                0,
            )],
            vec![],
        );
        let offset = ctx.intake_object(&referencing, Arch::Amd64, false).unwrap();
        ctx.ingest_headers(&referencing, offset);
        ctx.collect_undefined();
        ctx.resolve_undefined();
        assert_eq!(ctx.undefined.len(), 1);
    }

    #[test]
    fn duplicate_definitions_are_detected() {
        let mut ctx = LinkContext::new();
        let a = make_object(
            Arch::Amd64,
            vec![AeRecordHeader::with_name("foo.code64", PefKind::Code as u64)],
            vec![0x90],
        );
        let b = make_object(
            Arch::Amd64,
            vec![AeRecordHeader::with_name("foo.code64", PefKind::Code as u64)],
            vec![0x90],
        );
        for object in [&a, &b] {
            let offset = ctx.intake_object(object, Arch::Amd64, false).unwrap();
            ctx.ingest_headers(object, offset);
        }
        assert_eq!(ctx.find_duplicates().len(), 1);
    }

    #[test]
    fn arch_mismatch_without_fat_is_an_error() {
        let mut ctx = LinkContext::new();
        let object = make_object(Arch::Arm64, vec![], vec![]);
        assert!(ctx.intake_object(&object, Arch::Amd64, false).is_err());
        assert!(ctx.intake_object(&object, Arch::Amd64, true).is_ok());
    }

    #[test]
    fn entrypoint_enforcement_requires_start_found_for_exec() {
        let ctx = LinkContext::new();
        assert!(ctx.enforce_entrypoint(ImageKind::Exec).is_err());
        assert!(ctx.enforce_entrypoint(ImageKind::Dylib).is_ok());
    }

    #[test]
    fn synthetic_headers_append_in_fixed_order() {
        let mut ctx = LinkContext::new();
        ctx.push_synthetic_headers(Arch::Amd64, 0x10_0000, "2026-01-01T00:00:00Z", [0u8; 16]);
        assert_eq!(ctx.commands.len(), 5);
        assert!(ctx.commands[0].name_str().starts_with("BuildEpoch:"));
        assert_eq!(ctx.commands[1].name_str(), abi::MSFT);
        assert!(ctx.commands[2].name_str().starts_with("SizeOfReserveStack:"));
        assert!(ctx.commands[3].name_str().starts_with("GUID:4:"));
        assert_eq!(ctx.commands[4].name_str(), "Container:Exec:END");
    }
}
