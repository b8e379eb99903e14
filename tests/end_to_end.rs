//! End-to-end pipeline scenarios, assembling one or more objects in
//! memory and linking them the way `aeforge-ld`/`aeforge` would.

use aeforge::asm::AssemblerContext;
use aeforge::container::ae::AeObjectRef;
use aeforge::container::arch::Arch;
use aeforge::container::pef::{PefCommandHeader, PefKind};
use aeforge::link::{link, ImageKind, LinkerInput};
use aeforge::Error;

fn assemble(arch: Arch, source: &str) -> AeObjectRef {
    let mut ctx = AssemblerContext::new(arch, false);
    ctx.assemble(source).unwrap();
    let object = ctx.emit_ae(0);
    let mut bytes = Vec::new();
    object.write_to(&mut bytes).unwrap();
    AeObjectRef::parse(&bytes).unwrap()
}

fn input(objects: Vec<AeObjectRef>, arch: Arch, fat: bool) -> LinkerInput {
    LinkerInput {
        objects,
        arch,
        fat,
        kind: ImageKind::Exec,
        stack_size: aeforge::link::DEFAULT_STACK_SIZE,
        build_epoch: "2026-07-31T00:00:00Z".to_string(),
        guid: [0xAB; 16],
    }
}

/// S1 — a single-section executable links to a command table of one
/// code header plus the five synthetic headers, with the container's
/// `start` pointing at the entrypoint's post-layout offset.
#[test]
fn empty_executable_scenario() {
    let object = assemble(Arch::Amd64, "public_segment __ImageStart .code64\nnop\n");
    let image = link(input(vec![object], Arch::Amd64, false)).unwrap();

    assert_eq!(image.commands.len(), 6);
    let entrypoint = image.entrypoint().expect("entrypoint header present");
    assert_eq!(image.container.start, entrypoint.offset);
    let header_size = std::mem::size_of::<PefCommandHeader>() as u64;
    assert!(image.container.start >= image.commands.len() as u64 * header_size + 16);
}

/// S2 — two objects defining the same public segment abort the link
/// with a duplicate-symbol error, never reaching a written image.
#[test]
fn duplicate_symbol_scenario() {
    let a = assemble(Arch::Amd64, "public_segment foo .code64\nnop\n");
    let b = assemble(Arch::Amd64, "public_segment foo .code64\nnop\n");
    let err = link(input(vec![a, b], Arch::Amd64, false)).unwrap_err();
    match err {
        Error::DuplicateSymbol(name) => assert_eq!(name, "foo.code64"),
        other => panic!("expected DuplicateSymbol, got {other:?}"),
    }
}

/// S3 — an unresolved `extern_segment` reference aborts the link with
/// the mangled symbol name surfaced in the error.
#[test]
fn unresolved_reference_scenario() {
    let a = assemble(
        Arch::Amd64,
        "public_segment __ImageStart .code64\nextern_segment bar\nnop\n",
    );
    let err = link(input(vec![a], Arch::Amd64, false)).unwrap_err();
    assert!(matches!(err, Error::UnresolvedSymbol(_)));
}

/// S4 — linking AMD64 and ARM64 objects with `-fat` succeeds and the
/// image's `cpu` mask carries both architectures' bits.
#[test]
fn fat_binary_scenario() {
    let amd64 = assemble(Arch::Amd64, "public_segment __ImageStart .code64\nnop\n");
    let arm64 = assemble(Arch::Arm64, "public_segment data .data64\nnop\n");
    let image = link(input(vec![amd64, arm64], Arch::Amd64, true)).unwrap();

    let amd64_bit = 1u32 << Arch::Amd64.cpu_bit();
    let arm64_bit = 1u32 << Arch::Arm64.cpu_bit();
    assert_eq!(image.container.cpu & amd64_bit, amd64_bit);
    assert_eq!(image.container.cpu & arm64_bit, arm64_bit);
}

/// R3 — the linked header count equals the kept-record count across
/// every input object plus the five synthetic headers.
#[test]
fn header_count_matches_kept_records_plus_synthetics() {
    let a = assemble(
        Arch::Amd64,
        "public_segment __ImageStart .code64\nnop\npublic_segment data .data64\nnop\n",
    );
    let kept_records = a.records.len();
    let image = link(input(vec![a], Arch::Amd64, false)).unwrap();
    assert_eq!(image.commands.len(), kept_records + 5);
}

/// A referencing object's `extern_segment` resolves against a separate
/// defining object's matching public segment.
#[test]
fn cross_object_symbol_resolution_scenario() {
    let library = assemble(Arch::Amd64, "public_segment helper .code64\nnop\n");
    let program = assemble(
        Arch::Amd64,
        "public_segment __ImageStart .code64\nextern_segment helper\nnop\n",
    );
    let image = link(input(vec![library, program], Arch::Amd64, false)).unwrap();
    assert!(image
        .commands
        .iter()
        .any(|c| c.name_str().contains("helper") && c.kind == PefKind::Code as u16));
}
