//! Standalone assembler stage binary: encodes one assembly file into an
//! AE relocatable object (or, with `-binary`, a flat blob).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aeforge::asm::AssemblerContext;
use aeforge::driver;
use aeforge::driver::cli::Flags;
use aeforge::error::exit_code;

fn main() -> ExitCode {
    driver::install_panic_hook("as");
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags = Flags::parse(args);

    if flags.help {
        println!("usage: aeforge-as [-64k|-32k|-amd64|-power64|-arm64|-riscv64] [-binary] [-fmax-exceptions N] FILE");
        return ExitCode::SUCCESS;
    }
    if flags.version {
        println!("{}", driver::banner("as"));
        return ExitCode::SUCCESS;
    }
    if flags.verbose {
        stderrlog::new().verbosity(3).init().ok();
        eprintln!("{}", driver::banner("as"));
    }

    let Some(arch) = flags.arch else {
        eprintln!("aeforge-as: no target architecture selected (-64k/-32k/-amd64/-power64/-arm64/-riscv64)");
        return ExitCode::from(1);
    };

    for input in &flags.inputs {
        let path = Path::new(input);
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("aeforge-as: {input}: {err}");
                return ExitCode::from(exit_code(&aeforge::Error::from(err)) as u8);
            }
        };

        let mut ctx = AssemblerContext::new(arch, flags.binary);
        if let Some(limit) = flags.fmax_exceptions {
            ctx.error_limit = limit;
        }
        if let Err(err) = ctx.assemble(&source) {
            for diagnostic in &ctx.errors {
                eprintln!("aeforge-as: {input}: {diagnostic}");
            }
            eprintln!("aeforge-as: {input}: {err}");
            return ExitCode::from(exit_code(&err) as u8);
        }

        let (bytes, out_path) = if flags.binary {
            (ctx.emit_flat(), with_extension(path, "bin"))
        } else {
            let object = ctx.emit_ae(0);
            let mut bytes = Vec::new();
            if let Err(err) = object.write_to(&mut bytes) {
                eprintln!("aeforge-as: {input}: {err}");
                return ExitCode::from(exit_code(&err) as u8);
            }
            (bytes, with_extension(path, "obj"))
        };

        if let Err(err) = std::fs::write(&out_path, &bytes) {
            eprintln!("aeforge-as: {input}: {err}");
            return ExitCode::from(exit_code(&aeforge::Error::from(err)) as u8);
        }
    }
    ExitCode::SUCCESS
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
