//! The `std`-backed driver: CLI flag parsing, filesystem `#include`
//! resolution, and pipeline sequencing (§4.4, §6.2). Everything under
//! [`crate::preprocess`], [`crate::asm`], and [`crate::link`] is pure and
//! testable without a filesystem; this module is the thin I/O shell
//! around it that the four `aeforge-*` binaries call into.

pub mod cli;
mod fs_include;
pub mod pipeline;

pub use cli::Flags;
pub use fs_include::FsIncludeSource;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs a crash-banner panic hook so an internal bug surfaces as a
/// labeled diagnostic (which stage, which version) instead of a bare
/// Rust backtrace, treating a panic as a reportable tool failure rather
/// than silent noise.
pub fn install_panic_hook(stage: &'static str) {
    std::panic::set_hook(std::boxed::Box::new(move |info| {
        eprintln!("aeforge-{stage}: internal error (v{VERSION}): {info}");
        eprintln!("this is a bug in the {stage} stage, not in your source");
    }));
}

/// One line of the `-verbose` startup banner every stage binary prints.
pub fn banner(stage: &str) -> String {
    std::format!("aeforge-{stage} {VERSION}")
}
