//! Hand-rolled flag scanning for the CLI surface shared by all four
//! stages (§6.2). No argument-parsing crate is pulled in — the flag set
//! is small and flat enough not to need one, and nothing else in this
//! crate's dependency stack pulls one in either.

use crate::container::arch::Arch;

pub const PEF_EXT: &str = ".pef";
pub const PEF_DYLIB_EXT: &str = ".dylib.pef";

/// Parsed flags, unioned across all four stages (§6.2). Each stage binary
/// only consults the fields relevant to it; unrecognized flags collect in
/// `unknown` so the caller can print one diagnostic per flag and keep
/// going, matching "unknown flags are diagnosed and skipped."
#[derive(Debug, Default)]
pub struct Flags {
    pub help: bool,
    pub version: bool,
    pub verbose: bool,
    pub output: Option<String>,
    pub arch: Option<Arch>,
    pub fat: bool,
    pub dylib: bool,
    pub include_dirs: Vec<String>,
    pub working_dir: Option<String>,
    pub defines: Vec<(String, String)>,
    pub binary: bool,
    pub fmax_exceptions: Option<usize>,
    pub inputs: Vec<String>,
    pub unknown: Vec<String>,
}

impl Flags {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Flags {
        let mut flags = Flags::default();
        let mut iter = args.into_iter().peekable();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-help" | "--help" | "-h" => flags.help = true,
                "-version" | "--version" => flags.version = true,
                "-verbose" => flags.verbose = true,
                "-output" => flags.output = iter.next(),
                "-64k" => flags.arch = Some(Arch::Arch64000),
                "-32k" => flags.arch = Some(Arch::Arch32000),
                "-amd64" => flags.arch = Some(Arch::Amd64),
                "-power64" => flags.arch = Some(Arch::PowerPc),
                "-arm64" => flags.arch = Some(Arch::Arm64),
                "-riscv64" => flags.arch = Some(Arch::RiscV),
                "-fat" => flags.fat = true,
                "-dylib" => flags.dylib = true,
                "-include-dir" => {
                    if let Some(dir) = iter.next() {
                        flags.include_dirs.push(dir);
                    }
                }
                "-working-dir" => flags.working_dir = iter.next(),
                "-def" => {
                    if let (Some(name), Some(value)) = (iter.next(), iter.next()) {
                        flags.defines.push((name, value));
                    }
                }
                "-binary" => flags.binary = true,
                "-fmax-exceptions" => {
                    if let Some(value) = iter.next() {
                        flags.fmax_exceptions = value.parse().ok();
                    }
                }
                other if other.starts_with('-') => flags.unknown.push(other.to_string()),
                positional => flags.inputs.push(positional.to_string()),
            }
        }
        infer_output_extension(&mut flags);
        flags
    }
}

/// `-output`'s extension inference: if `-dylib` selects a shared image,
/// swap a bare `.pef` suffix (or no suffix at all) for `.dylib.pef`
/// rather than leaving an executable-looking name on a shared image.
fn infer_output_extension(flags: &mut Flags) {
    let Some(output) = flags.output.take() else {
        return;
    };
    let adjusted = if flags.dylib {
        if let Some(stripped) = output.strip_suffix(PEF_EXT) {
            std::format!("{stripped}{PEF_DYLIB_EXT}")
        } else if output.ends_with(PEF_DYLIB_EXT) {
            output
        } else {
            std::format!("{output}{PEF_DYLIB_EXT}")
        }
    } else {
        output
    };
    flags.output = Some(adjusted);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn parses_arch_selection_flags() {
        let flags = Flags::parse(args(&["-amd64", "in.s"]));
        assert_eq!(flags.arch, Some(Arch::Amd64));
        assert_eq!(flags.inputs, vec!["in.s".to_string()]);
    }

    #[test]
    fn unknown_flags_are_collected_not_fatal() {
        let flags = Flags::parse(args(&["-nonsense", "in.s"]));
        assert_eq!(flags.unknown, vec!["-nonsense".to_string()]);
        assert_eq!(flags.inputs, vec!["in.s".to_string()]);
    }

    #[test]
    fn dylib_output_gets_dylib_extension() {
        let flags = Flags::parse(args(&["-dylib", "-output", "libfoo.pef"]));
        assert_eq!(flags.output.as_deref(), Some("libfoo.dylib.pef"));
    }

    #[test]
    fn non_dylib_output_extension_is_untouched() {
        let flags = Flags::parse(args(&["-output", "prog.pef"]));
        assert_eq!(flags.output.as_deref(), Some("prog.pef"));
    }
}
