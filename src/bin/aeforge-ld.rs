//! Standalone linker stage binary: merges a set of AE objects into a
//! single PEF image.

use std::path::PathBuf;
use std::process::ExitCode;

use aeforge::driver;
use aeforge::driver::cli::Flags;
use aeforge::driver::pipeline;
use aeforge::error::exit_code;

fn main() -> ExitCode {
    driver::install_panic_hook("ld");
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags = Flags::parse(args);

    if flags.help {
        println!("usage: aeforge-ld [-64k|-32k|-amd64|-power64|-arm64|-riscv64] [-fat] [-dylib] [-output PATH] OBJECT...");
        return ExitCode::SUCCESS;
    }
    if flags.version {
        println!("{}", driver::banner("ld"));
        return ExitCode::SUCCESS;
    }
    if flags.verbose {
        stderrlog::new().verbosity(3).init().ok();
        eprintln!("{}", driver::banner("ld"));
    }

    let Some(arch) = flags.arch else {
        eprintln!("aeforge-ld: no target architecture selected (-64k/-32k/-amd64/-power64/-arm64/-riscv64)");
        return ExitCode::from(1);
    };

    let objects: Vec<PathBuf> = flags.inputs.iter().map(PathBuf::from).collect();
    let output_path = flags
        .output
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("a.pef"));

    if let Err(err) = pipeline::link_objects(&objects, &flags, arch, &output_path) {
        eprintln!("aeforge-ld: {err}");
        return ExitCode::from(exit_code(&err) as u8);
    }
    ExitCode::SUCCESS
}
