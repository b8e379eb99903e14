//! AE-objects-to-PEF-image resolver (§4.3).
//!
//! [`resolver::LinkContext`] carries out steps 1-6 and 8; [`layout`]
//! carries out step 7 (offset shifting, entrypoint fix-up) and exposes
//! the documented step-10 post-check as a standalone pure function so it
//! can be tested against the scenarios in §8 independent of I/O.

mod layout;
mod resolver;

pub use layout::{layout, should_abort};
pub use resolver::{ImageKind, LinkContext};

use alloc::string::String;
use alloc::vec::Vec;

use crate::container::ae::AeObjectRef;
use crate::container::arch::Arch;
use crate::container::pef::{abi_code, PefContainer, PefImage, PEF_MAGIC_FAT};
use crate::error::{Error, Result};

/// Everything the linker needs that isn't itself an AE object: the
/// target architecture, FAT/arch-mismatch policy, the output kind, and
/// the two out-of-core-scope services (§1) the synthetic headers draw
/// on — a build epoch string and a 16-byte GUID, both supplied by the
/// driver rather than generated here.
pub struct LinkerInput {
    pub objects: Vec<AeObjectRef>,
    pub arch: Arch,
    pub fat: bool,
    pub kind: ImageKind,
    pub stack_size: u64,
    pub build_epoch: String,
    pub guid: [u8; 16],
}

/// Default reserved stack size stamped into the `SizeOfReserveStack`
/// synthetic header when a caller doesn't override it.
pub const DEFAULT_STACK_SIZE: u64 = 0x0010_0000;

/// Runs the full resolver/layout pipeline (§4.3 steps 1-10) and returns
/// the finished image. Any abort condition (missing entrypoint,
/// unresolved reference, duplicate definition) is surfaced as an `Err`;
/// the caller (the `ld` stage binary) is responsible for deleting a
/// partial output file on that path, per §5 "Cancellation".
pub fn link(input: LinkerInput) -> Result<PefImage> {
    let mut ctx = LinkContext::new();

    for object in &input.objects {
        let offset = ctx.intake_object(object, input.arch, input.fat)?;
        ctx.ingest_headers(object, offset);
    }

    ctx.collect_undefined();
    ctx.resolve_undefined();
    ctx.enforce_entrypoint(input.kind)?;
    ctx.push_synthetic_headers(input.arch, input.stack_size, &input.build_epoch, input.guid);

    let first_duplicate = ctx.find_duplicates().first().cloned();
    if let Some(name) = first_duplicate {
        return Err(Error::DuplicateSymbol(name));
    }

    let first_unresolved = ctx.undefined.iter().next().cloned();
    if let Some(name) = first_unresolved {
        return Err(Error::UnresolvedSymbol(name));
    }

    let mut container = PefContainer::new_thin(ctx.cpu, 0, abi_code(input.arch));
    if input.fat {
        container.magic = PEF_MAGIC_FAT;
    }
    container.kind = input.kind as u32;

    layout::layout(&mut container, &mut ctx.commands);

    Ok(PefImage {
        container,
        commands: ctx.commands,
        blob: ctx.blob,
    })
}
