//! Pure name-classification helpers shared by the assembler and linker.
//!
//! A symbol's *kind* is never stored as a separate tag during assembly —
//! it is carried entirely in the name, via a prefix (`:UndefinedSymbol:`,
//! `:RuntimeSymbol:`) or a section suffix (`.code64`, `.data64`,
//! `.zero64`). These functions are the single place that vocabulary is
//! spelled out, so the assembler and linker can't drift apart on it.

use alloc::borrow::ToOwned;
use alloc::string::String;

use crate::container::pef::PefKind;

pub const UNDEFINED_PREFIX: &str = ":UndefinedSymbol:";
pub const RUNTIME_PREFIX: &str = ":RuntimeSymbol:";
pub const ENTRYPOINT_SYMBOL: &str = "__ImageStart";

pub const CODE_SUFFIX: &str = ".code64";
pub const DATA_SUFFIX: &str = ".data64";
pub const ZERO_SUFFIX: &str = ".zero64";

/// True if `name` carries the `:UndefinedSymbol:` prefix — an `extern`
/// reference the linker must resolve against another object's headers.
pub fn is_undefined(name: &str) -> bool {
    name.starts_with(UNDEFINED_PREFIX)
}

/// True if `name` carries the `:RuntimeSymbol:` prefix — resolved by the
/// loader, never by the linker, so it's excluded from the undefined set
/// even though it also lacks a local definition.
pub fn is_runtime(name: &str) -> bool {
    name.starts_with(RUNTIME_PREFIX)
}

/// Strips the `:UndefinedSymbol:` prefix and drops every `$` separator in
/// the mangled remainder, yielding the bare run of name characters the
/// resolver substring-matches against defined headers.
///
/// The `$` is a one-way separator, not a reversible escape: both spaces
/// and commas collapse to it on the way in, so demangling can't tell
/// which one stood where. That's fine, the resolver only needs the
/// character run to line up for its substring scan.
pub fn demangle_undefined(name: &str) -> String {
    let stripped = name.strip_prefix(UNDEFINED_PREFIX).unwrap_or(name);
    stripped.chars().filter(|&ch| ch != '$').collect()
}

/// Builds the mangled `:UndefinedSymbol:` form of a reference, replacing
/// spaces and commas (illegal inside a record name) with `$`.
pub fn mangle_undefined(raw: &str) -> String {
    let mut out = String::with_capacity(UNDEFINED_PREFIX.len() + raw.len());
    out.push_str(UNDEFINED_PREFIX);
    for ch in raw.chars() {
        match ch {
            ' ' | ',' => out.push('$'),
            other => out.push(other),
        }
    }
    out
}

pub fn mark_runtime(raw: &str) -> String {
    let mut out = String::with_capacity(RUNTIME_PREFIX.len() + raw.len());
    out.push_str(RUNTIME_PREFIX);
    out.push_str(raw);
    out
}

/// Classifies a record name into the PEF kind it should carry once
/// linked, honoring the rule that `__ImageStart` is always forced to
/// `Code` no matter which section it was assembled under.
pub fn section_kind(name: &str) -> PefKind {
    if name == ENTRYPOINT_SYMBOL || name.ends_with(ENTRYPOINT_SYMBOL) {
        return PefKind::Code;
    }
    if name.ends_with(CODE_SUFFIX) {
        PefKind::Code
    } else if name.ends_with(DATA_SUFFIX) {
        PefKind::Data
    } else if name.ends_with(ZERO_SUFFIX) {
        PefKind::Zero
    } else {
        PefKind::Invalid
    }
}

/// True if `name`, once classified, is the forced-code entrypoint.
pub fn is_entrypoint(name: &str) -> bool {
    name == ENTRYPOINT_SYMBOL || name.ends_with(ENTRYPOINT_SYMBOL)
}

pub fn section_suffix_for(kind: PefKind) -> &'static str {
    match kind {
        PefKind::Code => CODE_SUFFIX,
        PefKind::Data => DATA_SUFFIX,
        PefKind::Zero => ZERO_SUFFIX,
        PefKind::LinkerId | PefKind::Sentinel | PefKind::Invalid => "",
    }
}

/// Builds a section-qualified record name, e.g. `join_section("text",
/// PefKind::Code)` -> `"text.code64"`.
pub fn join_section(base: &str, kind: PefKind) -> String {
    let mut out = base.to_owned();
    out.push_str(section_suffix_for(kind));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_mangling_collapses_separators_to_dollar() {
        let mangled = mangle_undefined("foo bar,baz");
        assert!(is_undefined(&mangled));
        assert_eq!(mangled, ":UndefinedSymbol:foo$bar$baz");
        assert_eq!(demangle_undefined(&mangled), "foobarbaz");
    }

    #[test]
    fn runtime_symbols_are_excluded_from_undefined() {
        let name = mark_runtime("__syscall_table");
        assert!(is_runtime(&name));
        assert!(!is_undefined(&name));
    }

    #[test]
    fn entrypoint_is_always_code() {
        assert_eq!(section_kind(ENTRYPOINT_SYMBOL), PefKind::Code);
        assert!(is_entrypoint(ENTRYPOINT_SYMBOL));
    }

    #[test]
    fn section_suffixes_classify_correctly() {
        assert_eq!(section_kind("text.code64"), PefKind::Code);
        assert_eq!(section_kind("globals.data64"), PefKind::Data);
        assert_eq!(section_kind("bss.zero64"), PefKind::Zero);
    }

    #[test]
    fn join_section_appends_expected_suffix() {
        assert_eq!(join_section("text", PefKind::Code), "text.code64");
        assert_eq!(join_section("globals", PefKind::Data), "globals.data64");
    }
}
