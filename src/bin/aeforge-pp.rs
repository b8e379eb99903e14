//! Standalone preprocessor stage binary: expands one source file's
//! directives and macros and writes the result to `<file>.pp`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aeforge::driver;
use aeforge::driver::cli::Flags;
use aeforge::error::exit_code;

fn main() -> ExitCode {
    driver::install_panic_hook("pp");
    let args: Vec<String> = std::env::args().skip(1).collect();
    let flags = Flags::parse(args);

    if flags.help {
        println!("usage: aeforge-pp [-verbose] [-include-dir DIR]... [-working-dir DIR] [-def NAME VALUE]... FILE");
        return ExitCode::SUCCESS;
    }
    if flags.version {
        println!("{}", driver::banner("pp"));
        return ExitCode::SUCCESS;
    }
    if flags.verbose {
        stderrlog::new().verbosity(3).init().ok();
        eprintln!("{}", driver::banner("pp"));
    }

    let working_dir = flags
        .working_dir
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    for input in &flags.inputs {
        let path = Path::new(input);
        let mut includes = aeforge::driver::FsIncludeSource::new(&working_dir, &flags.include_dirs);
        let mut pp = aeforge::preprocess::Preprocessor::new(&mut includes);
        for (name, value) in &flags.defines {
            pp.seed(name, value);
        }
        let result = std::fs::read_to_string(path)
            .map_err(aeforge::Error::from)
            .and_then(|source| pp.run(&source));
        match result {
            Ok(expanded) => {
                let out_path = pipeline_pp_path(path);
                if let Err(err) = std::fs::write(&out_path, &expanded) {
                    eprintln!("aeforge-pp: {input}: {err}");
                    return ExitCode::from(exit_code(&aeforge::Error::from(err)) as u8);
                }
            }
            Err(err) => {
                eprintln!("aeforge-pp: {input}: {err}");
                return ExitCode::from(exit_code(&err) as u8);
            }
        }
        for warning in pp.warnings() {
            eprintln!("aeforge-pp: {input}: warning: {warning}");
        }
    }
    ExitCode::SUCCESS
}

fn pipeline_pp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".pp");
    PathBuf::from(name)
}
