//! The `aeforge` driver: runs every source file through preprocess,
//! compile-stub, and assemble, then links the resulting objects into a
//! single PEF image (§4.4).

use std::process::ExitCode;

use aeforge::driver;
use aeforge::driver::cli::Flags;
use aeforge::driver::pipeline;
use aeforge::error::exit_code;

fn main() -> ExitCode {
    driver::install_panic_hook("driver");
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags = Flags::parse(args);

    if flags.help {
        println!(
            "usage: aeforge [-64k|-32k|-amd64|-power64|-arm64|-riscv64] [-fat] [-dylib] \
             [-binary] [-output PATH] [-include-dir DIR]... [-working-dir DIR] \
             [-def NAME VALUE]... [-fmax-exceptions N] [-verbose] FILE..."
        );
        return ExitCode::SUCCESS;
    }
    if flags.version {
        println!("{}", driver::banner("driver"));
        return ExitCode::SUCCESS;
    }
    if flags.verbose {
        stderrlog::new().verbosity(3).init().ok();
        eprintln!("{}", driver::banner("driver"));
    }

    for unknown in &flags.unknown {
        eprintln!("aeforge: warning: unrecognized flag '{unknown}'");
    }

    if flags.inputs.is_empty() {
        eprintln!("aeforge: no input files");
        return ExitCode::from(1);
    }

    if let Err(err) = pipeline::run(&flags) {
        eprintln!("aeforge: {err}");
        return ExitCode::from(exit_code(&err) as u8);
    }
    ExitCode::SUCCESS
}
