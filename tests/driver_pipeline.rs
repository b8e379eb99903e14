//! Filesystem-backed driver integration: preprocess -> assemble -> link
//! over real files in a scratch directory, exercising the same code
//! path the `aeforge` binary drives.

use std::fs;
use std::path::PathBuf;

use aeforge::container::arch::Arch;
use aeforge::driver::cli::Flags;
use aeforge::driver::pipeline;

fn scratch_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("aeforge-test-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn full_pipeline_produces_a_pef_image() {
    let dir = scratch_dir("full-pipeline");
    let source_path = dir.join("main.s");
    fs::write(
        &source_path,
        "#define ENTRY __ImageStart\npublic_segment ENTRY .code64\nnop\n",
    )
    .unwrap();

    let output_path = dir.join("out.pef");
    let flags = Flags::parse(vec![
        "-amd64".to_string(),
        "-output".to_string(),
        output_path.to_string_lossy().into_owned(),
        source_path.to_string_lossy().into_owned(),
    ]);

    pipeline::run(&flags).unwrap();

    let bytes = fs::read(&output_path).unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(&bytes[..4], b"Open");

    let pp_path = dir.join("main.s.pp");
    let preprocessed = fs::read_to_string(&pp_path).unwrap();
    assert!(preprocessed.contains("public_segment __ImageStart .code64"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn include_directive_pulls_from_include_dir() {
    let dir = scratch_dir("include-dir");
    let include_dir = dir.join("include");
    fs::create_dir_all(&include_dir).unwrap();
    fs::write(include_dir.join("decls.inc"), "#define GREETING_LEN 5\n").unwrap();

    let source_path = dir.join("uses_include.s");
    fs::write(
        &source_path,
        "#include <decls.inc>\npublic_segment __ImageStart .code64\nnop\n",
    )
    .unwrap();

    let output_path = dir.join("out.pef");
    let flags = Flags::parse(vec![
        "-amd64".to_string(),
        "-include-dir".to_string(),
        include_dir.to_string_lossy().into_owned(),
        "-output".to_string(),
        output_path.to_string_lossy().into_owned(),
        source_path.to_string_lossy().into_owned(),
    ]);

    pipeline::run(&flags).unwrap();
    assert!(output_path.exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn arch_mismatch_without_fat_is_rejected_end_to_end() {
    let dir = scratch_dir("arch-mismatch");
    let amd64_src = dir.join("a.s");
    let arm64_src = dir.join("b.s");
    fs::write(&amd64_src, "public_segment __ImageStart .code64\nnop\n").unwrap();
    fs::write(&arm64_src, "public_segment other .data64\nnop\n").unwrap();

    let mut ctx_a = aeforge::asm::AssemblerContext::new(Arch::Amd64, false);
    ctx_a.assemble(&fs::read_to_string(&amd64_src).unwrap()).unwrap();
    let object_a = ctx_a.emit_ae(0);
    let mut bytes_a = Vec::new();
    object_a.write_to(&mut bytes_a).unwrap();
    fs::write(dir.join("a.obj"), &bytes_a).unwrap();

    let mut ctx_b = aeforge::asm::AssemblerContext::new(Arch::Arm64, false);
    ctx_b.assemble(&fs::read_to_string(&arm64_src).unwrap()).unwrap();
    let object_b = ctx_b.emit_ae(0);
    let mut bytes_b = Vec::new();
    object_b.write_to(&mut bytes_b).unwrap();
    fs::write(dir.join("b.obj"), &bytes_b).unwrap();

    let output_path = dir.join("out.pef");
    let flags = Flags::parse(vec!["-amd64".to_string()]);
    let result = pipeline::link_objects(
        &[dir.join("a.obj"), dir.join("b.obj")],
        &flags,
        Arch::Amd64,
        &output_path,
    );
    assert!(result.is_err());
    assert!(!output_path.exists());

    fs::remove_dir_all(&dir).ok();
}
